use rand::{rngs::StdRng, SeedableRng};
use tictactoe_rl::{
    algo::Opponent,
    ds::ValueTable,
    eval::{self, EvalConfig},
    gym::{Board, Cell},
    play::Session,
    train::{Trainer, TrainerConfig},
};

const EMPTY_BOARD: &str = "         ";

fn trainer(episodes: u32) -> Trainer {
    Trainer::new(TrainerConfig {
        episodes,
        seed: Some(42),
        ..Default::default()
    })
}

#[test]
fn train_save_load_evaluate() {
    let trainer = trainer(2000);
    let mut agent = trainer.agent(ValueTable::new()).unwrap();
    let tally = trainer.train(&mut agent, &mut StdRng::seed_from_u64(42));
    assert_eq!(tally.total(), 2000);
    assert!(agent.table().contains_state(EMPTY_BOARD), "Empty board learned");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q_table.json");
    agent.save(&path).unwrap();

    let loaded = ValueTable::load(&path).unwrap();
    assert_eq!(&loaded, agent.table(), "Saved table reloads unchanged");

    let frozen = trainer.agent(loaded).unwrap();
    let reports = eval::evaluate(
        &frozen,
        &EvalConfig {
            games: 200,
            seed: Some(7),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(reports.len(), 3);
    let vs_random = reports
        .iter()
        .find(|r| r.opponent == Opponent::Random)
        .unwrap();
    assert!(
        vs_random.tally.wins > vs_random.tally.losses,
        "A trained first mover beats a random opponent more often than not"
    );
}

#[test]
fn resumed_training_extends_the_table() {
    let trainer = trainer(200);
    let mut agent = trainer.agent(ValueTable::new()).unwrap();
    trainer.train(&mut agent, &mut StdRng::seed_from_u64(1));
    let first = agent.table().num_values();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q_table.json");
    agent.save(&path).unwrap();

    let mut resumed = trainer.agent(ValueTable::load_or_empty(&path)).unwrap();
    trainer.train(&mut resumed, &mut StdRng::seed_from_u64(2));
    assert!(resumed.table().num_values() >= first, "Resuming never loses entries");
}

#[test]
fn trained_table_drives_a_play_session() {
    let trainer = trainer(500);
    let mut agent = trainer.agent(ValueTable::new()).unwrap();
    trainer.train(&mut agent, &mut StdRng::seed_from_u64(3));

    let mut session = Session::new(agent, false);
    let mut rng = StdRng::seed_from_u64(4);
    let opening = session.ai_move(&mut rng).unwrap();
    assert_eq!(session.board().get(opening), Some(session.ai()));
    assert_ne!(*session.board(), Board::new());
    assert!(!session.human_move(opening), "Occupied cell rejected");
    let reply = Cell::all().find(|&c| session.board().is_free(c)).unwrap();
    assert!(session.human_move(reply));
}
