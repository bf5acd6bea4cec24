/// Represents a turn-based, fully observable game in which a learning agent acts.
///
/// The environment tracks whose turn it is; [`step`](Environment::step) always
/// places the move for the side to move and reports the reward from the learner's
/// point of view.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Determine if the state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by the side to move,
    /// producing the next state, its reward and whether the episode ended
    fn step(&mut self, action: Self::Action) -> Transition<Self::State>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// The outcome of a single [`step`](Environment::step)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<S> {
    /// The state after the action was applied (or unchanged, if it was rejected)
    pub next_state: S,
    /// The reward for the learning side
    pub reward: f64,
    /// Whether the episode is over
    pub done: bool,
}

/// Represents a single experience or transition in the environment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exp<S, A> {
    /// The state of the environment before taking the action
    pub state: S,
    /// The action taken in the given state
    pub action: A,
    /// The reward received after taking the action
    pub reward: f64,
    /// The state of the environment after the action is taken
    pub next_state: S,
    /// Whether `next_state` is terminal
    pub done: bool,
}

impl<S: Clone, A> Exp<S, A> {
    /// Pair a state and action with the transition they produced
    pub fn from_transition(state: S, action: A, transition: &Transition<S>) -> Self {
        Self {
            state,
            action,
            reward: transition.reward,
            next_state: transition.next_state.clone(),
            done: transition.done,
        }
    }
}
