/*!
The value presented to guards and actions during evaluation.
*/

use std::fmt;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Either an externally posted event, or the internal completion token used
/// to evaluate completion transitions once a vertex becomes complete.
///
/// There is no separate "trigger" concept in this model; a transition that is
/// only meant to fire on a named external event simply writes a guard that
/// returns `false` for `Message::Completion`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Message<M> {
    Event(M),
    Completion,
}

// ------------------------------------------------------------------------------------------------
// Implementations
// ------------------------------------------------------------------------------------------------

impl<M> Message<M> {
    pub fn is_completion(&self) -> bool {
        matches!(self, Message::Completion)
    }

    pub fn event(&self) -> Option<&M> {
        match self {
            Message::Event(m) => Some(m),
            Message::Completion => None,
        }
    }
}

impl<M: fmt::Display> fmt::Display for Message<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Event(m) => write!(f, "{}", m),
            Message::Completion => write!(f, "<completion>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_not_an_event() {
        let msg: Message<&str> = Message::Completion;
        assert!(msg.is_completion());
        assert_eq!(msg.event(), None);
    }

    #[test]
    fn event_carries_its_payload() {
        let msg = Message::Event("go");
        assert!(!msg.is_completion());
        assert_eq!(msg.event(), Some(&"go"));
    }
}
