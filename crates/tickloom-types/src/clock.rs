/// A single logical tick counter.
///
/// `Tick` is the sole unit of logical time in the framework (GLOSSARY).
/// It is a plain monotonic counter; nothing about it is tied to wall
/// clock time (§1 Non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    pub fn saturating_add(self, delta: u64) -> Tick {
        Tick(self.0.saturating_add(delta))
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;

    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-process monotonic logical clock.
///
/// Owned exclusively by the `Cluster` (§3 Ownership); every other
/// component that needs "now" holds a non-owning reference. Advanced
/// by `+1` per tick by default but externally settable to inject clock
/// skew in tests (`setTimeForProcess` / `advanceTimeForProcess` in
/// §4.G).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicalClock {
    now: Tick,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self { now: Tick::ZERO }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advances the clock by one tick; this is what `Cluster::tick`
    /// calls for every known process before components tick.
    pub fn advance(&mut self) {
        self.now = self.now + 1;
    }

    /// Advances the clock by an arbitrary number of ticks (test-induced
    /// skew via `advanceTimeForProcess`).
    pub fn advance_by(&mut self, delta: u64) {
        self.now = self.now.saturating_add(delta);
    }

    /// Overwrites the clock outright (test-induced skew via
    /// `setTimeForProcess`).
    pub fn set(&mut self, tick: Tick) {
        self.now = tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_one_by_default() {
        let mut clock = LogicalClock::new();
        clock.advance();
        assert_eq!(clock.now(), Tick(1));
    }

    #[test]
    fn set_overrides_skew() {
        let mut clock = LogicalClock::new();
        clock.set(Tick(100));
        assert_eq!(clock.now(), Tick(100));
        clock.advance();
        assert_eq!(clock.now(), Tick(101));
    }

    proptest::proptest! {
        /// `saturating_add` never panics and never produces a tick
        /// before the one it started from, even right at `u64::MAX`.
        #[test]
        fn saturating_add_never_decreases(start in 0u64..=u64::MAX, delta in 0u64..=u64::MAX) {
            let advanced = Tick(start).saturating_add(delta);
            prop_assert!(advanced.0 >= start);
        }
    }
}
