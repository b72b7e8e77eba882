//! Confirmation gate.

use crate::session::KnownFacts;

/// Decides whether a complete fact set must be shown and accepted first.
///
/// A fact set the user gave in full is always confirmed. When the only gaps
/// were optional ratings that got defaulted after patience ran out, the
/// commit goes straight through, unless the duration itself is still an
/// unconfirmed estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationGate;

impl ConfirmationGate {
    pub fn requires_confirmation(&self, facts: &KnownFacts, defaults_applied: bool) -> bool {
        !defaults_applied || facts.duration_estimated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_policy() {
        let gate = ConfirmationGate;
        let mut facts = KnownFacts::default();

        assert!(gate.requires_confirmation(&facts, false));
        assert!(!gate.requires_confirmation(&facts, true));

        facts.duration_estimated = true;
        assert!(gate.requires_confirmation(&facts, true));
    }
}
