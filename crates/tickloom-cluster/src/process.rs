use tickloom_types::{ProcessId, Tick};

/// The minimal capability set a `Cluster` Node needs from whatever it
/// holds — a `Client`, or an application-defined replica (§9 "Model as
/// composition: the scheduler holds a collection of value-typed Nodes
/// that each own a `Process` trait object with a minimal capability
/// set {onTick, onMessage, tick}").
///
/// `on_message_received` itself comes from
/// `tickloom_runtime::MessageHandler`, which every `Process` must also
/// implement; this trait only adds the identity and tick-advance hooks
/// the scheduler drives directly.
pub trait Process: tickloom_runtime::MessageHandler {
    fn id(&self) -> &ProcessId;

    /// Advances this process to `now`, the tick its owning `Node`'s
    /// `LogicalClock` has just reached.
    fn tick(&mut self, now: Tick);
}

impl Process for tickloom_process::Client {
    fn id(&self) -> &ProcessId {
        tickloom_process::Client::id(self)
    }

    fn tick(&mut self, now: Tick) {
        tickloom_process::Client::tick(self, now);
    }
}
