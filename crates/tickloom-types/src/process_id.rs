use std::fmt::{self, Display};
use std::sync::Arc;

/// Opaque identifier for any participant in a cluster: a replica, a
/// client, or a test peer.
///
/// `ProcessId`s are equal by value and globally unique within the
/// `Cluster` that owns them; the framework never interprets their
/// contents. Cloning is cheap (`Arc<str>` refcount bump) since process
/// ids are copied into every `Message`, waiting-list entry, and
/// scheduler table.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(Arc<str>);

impl ProcessId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessId({})", self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for ProcessId {
    fn from(value: String) -> Self {
        Self(Arc::from(value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_by_value() {
        assert_eq!(ProcessId::from("athens"), ProcessId::from("athens"));
        assert_ne!(ProcessId::from("athens"), ProcessId::from("byzantium"));
    }

    #[test]
    fn cheap_clone_preserves_equality() {
        let a = ProcessId::from("athens");
        let b = a.clone();
        assert_eq!(a, b);
    }
}
