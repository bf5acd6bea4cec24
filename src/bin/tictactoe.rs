use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};

use tictactoe_rl::{
    algo::{Opponent, QTableAgent},
    config::AppConfig,
    decay::Decay,
    ds::ValueTable,
    eval::{self, Report},
    gym::{Cell, Outcome},
    play::Session,
    train::Trainer,
};

/// Train, evaluate and play against a tabular Q-learning tic-tac-toe agent
#[derive(Parser)]
#[command(name = "tictactoe", version, about)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, global = true, default_value = "tictactoe.toml")]
    config: PathBuf,

    /// Value table location, overriding the configuration
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the agent against a fixed opponent and save its table
    Train(TrainArgs),
    /// Measure a saved table against the evaluation opponents
    Evaluate(EvalArgs),
    /// Play against a saved table in the terminal
    Play(PlayArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<u32>,

    /// Opponent to train against: random, heuristic, center-first or tactical
    #[arg(long)]
    opponent: Option<Opponent>,

    /// Continue from the existing table instead of starting from scratch
    #[arg(long)]
    resume: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Show the terminal dashboard while training
    #[cfg(feature = "viz")]
    #[arg(long)]
    viz: bool,
}

#[derive(Args)]
struct EvalArgs {
    /// Override games per opponent
    #[arg(long)]
    games: Option<u32>,

    /// Opponents to evaluate against (repeatable)
    #[arg(long = "opponent")]
    opponents: Vec<Opponent>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct PlayArgs {
    /// Let the agent open each game
    #[arg(long)]
    ai_first: bool,

    /// Pause before the agent replies
    #[arg(long)]
    delay_ms: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(table) = cli.table {
        config.table_path = table;
    }

    match cli.command {
        Command::Train(args) => train(config, args, cli.verbose),
        Command::Evaluate(args) => {
            init_logger(cli.verbose);
            evaluate(config, args)
        }
        Command::Play(args) => {
            init_logger(cli.verbose);
            play(config, args)
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn seeded(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn load_table(path: &Path) -> Result<ValueTable> {
    ValueTable::load(path).with_context(|| {
        format!(
            "could not load a trained table from {} (run `tictactoe train` first)",
            path.display()
        )
    })
}

fn train(mut config: AppConfig, args: TrainArgs, verbose: u8) -> Result<()> {
    if let Some(episodes) = args.episodes {
        config.trainer.episodes = episodes;
    }
    if let Some(opponent) = args.opponent {
        config.trainer.opponent = opponent;
    }
    if args.seed.is_some() {
        config.trainer.seed = args.seed;
    }

    #[cfg(feature = "viz")]
    let dashboard = args
        .viz
        .then(|| tictactoe_rl::viz::init(config.trainer.episodes));
    #[cfg(not(feature = "viz"))]
    let dashboard: Option<()> = None;
    if dashboard.is_none() {
        init_logger(verbose);
    }

    let table = if args.resume {
        ValueTable::load_or_empty(&config.table_path)
    } else {
        ValueTable::new()
    };

    let trainer = Trainer::new(config.trainer.clone());
    let mut agent = trainer.agent(table).context("invalid trainer configuration")?;
    let mut rng = seeded(config.trainer.seed);

    #[cfg(feature = "viz")]
    if let Some(dashboard) = dashboard {
        trainer.train_with(&mut agent, &mut rng, |progress| dashboard.send(progress));
        dashboard.close().context("training dashboard failed")?;
        return save_table(&agent, &config.table_path);
    }

    trainer.train(&mut agent, &mut rng);
    save_table(&agent, &config.table_path)
}

fn save_table<D: Decay>(agent: &QTableAgent<D>, path: &Path) -> Result<()> {
    agent
        .save(path)
        .with_context(|| format!("saving table to {}", path.display()))
}

fn evaluate(mut config: AppConfig, args: EvalArgs) -> Result<()> {
    if let Some(games) = args.games {
        config.eval.games = games;
    }
    if !args.opponents.is_empty() {
        config.eval.opponents = args.opponents;
    }
    if args.seed.is_some() {
        config.eval.seed = args.seed;
    }

    let table = load_table(&config.table_path)?;
    let agent = Trainer::new(config.trainer.clone()).agent(table)?;
    let reports = eval::evaluate(&agent, &config.eval)?;

    println!("{:<14} {:>8} {:>8} {:>8}", "opponent", "win %", "loss %", "draw %");
    for Report { opponent, tally } in reports {
        println!(
            "{:<14} {:>8.1} {:>8.1} {:>8.1}",
            opponent.to_string(),
            tally.win_rate() * 100.0,
            tally.loss_rate() * 100.0,
            tally.draw_rate() * 100.0,
        );
    }
    Ok(())
}

fn play(config: AppConfig, args: PlayArgs) -> Result<()> {
    let table = load_table(&config.table_path)?;
    let agent = Trainer::new(config.trainer.clone()).agent(table)?;
    let human_first = config.play.human_first && !args.ai_first;
    let delay = Duration::from_millis(args.delay_ms.unwrap_or(config.play.ai_delay_ms));

    let mut session = Session::new(agent, human_first);
    let mut rng = StdRng::from_entropy();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!(
        "You are {}. Enter moves as `row col` (0-2), `n` for a new game, `q` to quit.",
        session.human()
    );

    loop {
        if !session.is_over() && !session.is_human_turn() {
            thread::sleep(delay);
            if let Some(cell) = session.ai_move(&mut rng) {
                println!("{} plays {cell}", session.ai());
            }
            continue;
        }

        println!("\n{}", session.board());
        if session.is_over() {
            announce(&session);
            print!("Play again? [n]ew / [q]uit: ");
        } else {
            print!("Your move: ");
        }
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("reading input")?;
        match line.trim() {
            "q" | "quit" => break,
            "n" | "new" => session.reset(),
            _ if session.is_over() => {}
            input => match input.parse::<Cell>() {
                Ok(cell) if session.human_move(cell) => {}
                Ok(cell) => println!("{cell} is taken"),
                Err(e) => println!("{e}"),
            },
        }
    }

    let stats = session.stats();
    println!(
        "Games: {} | AI wins: {} | losses: {} | draws: {} | win rate: {:.1}% | states learned: {}",
        stats.games,
        stats.wins,
        stats.losses,
        stats.draws,
        stats.win_rate() * 100.0,
        stats.states_learned,
    );
    Ok(())
}

fn announce<D: Decay>(session: &Session<D>) {
    match session.outcome() {
        Some(Outcome::Won(mark)) if mark == session.human() => println!("You win!"),
        Some(Outcome::Won(_)) => println!("The AI wins."),
        Some(Outcome::Draw) => println!("Draw."),
        None => {}
    }
}
