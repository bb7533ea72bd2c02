use crate::protocol::{Event, Role};

/// Instruction returned by an agent to its runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver the event after the simulated delay.
    Send(Event),
    /// Deliver the event after the simulated delay, then dispatch `Input::Resume`.
    SendAndResume(Event),
    /// Replace any running countdown with a fresh one tagged `generation`.
    StartCountdown { generation: u64 },
    CancelCountdown,
    /// Leave the relay.
    Close,
}

/// Everything an agent can be asked to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<C> {
    Event(Event),
    Command(C),
    /// A `SendAndResume` message has been delivered.
    Resume,
    CountdownTick(u64),
}

pub trait Agent: Send + 'static {
    type Command: Send + 'static;
    type Status: Clone + Send + Sync + 'static;

    /// Role requested from the relay on connect.
    fn role(&self) -> Role;

    fn dispatch(&mut self, input: Input<Self::Command>) -> Vec<Effect>;

    fn status(&self) -> Self::Status;
}
