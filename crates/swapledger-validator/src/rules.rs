//! Ordered, short-circuiting rule chains.
//!
//! A [`RuleChain`] is a list of `(kind, label, predicate)` entries evaluated
//! strictly in insertion order. Predicates are closures and run lazily:
//! once one fails, none of the later predicates is evaluated, and the
//! failing entry's label becomes the [`Violation`] reason.

use std::borrow::Cow;
use std::fmt;

use swapledger_types::{Violation, ViolationKind};

type Predicate<'a> = Box<dyn Fn() -> bool + 'a>;

/// One named requirement.
pub struct Rule<'a> {
    kind: ViolationKind,
    label: Cow<'static, str>,
    predicate: Predicate<'a>,
}

impl Rule<'_> {
    #[must_use]
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Rule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Ordered list of requirements; first failure wins.
#[derive(Debug, Default)]
pub struct RuleChain<'a> {
    rules: Vec<Rule<'a>>,
}

impl<'a> RuleChain<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a requirement: `predicate` must hold, otherwise the chain
    /// fails with `kind` tagged by `label`.
    #[must_use]
    pub fn require(
        mut self,
        kind: ViolationKind,
        label: impl Into<Cow<'static, str>>,
        predicate: impl Fn() -> bool + 'a,
    ) -> Self {
        self.rules.push(Rule {
            kind,
            label: label.into(),
            predicate: Box::new(predicate),
        });
        self
    }

    /// Append every rule of `other` after the rules already present.
    #[must_use]
    pub fn then(mut self, other: RuleChain<'a>) -> Self {
        self.rules.extend(other.rules);
        self
    }

    /// Evaluate in order and report the first failing rule.
    ///
    /// # Errors
    /// The [`Violation`] of the first rule whose predicate is `false`.
    pub fn evaluate(&self) -> Result<(), Violation> {
        match self.rules.iter().find(|rule| !(rule.predicate)()) {
            Some(rule) => Err(rule.kind.with_reason(rule.label.as_ref())),
            None => Ok(()),
        }
    }

    /// Rule labels in evaluation order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(Rule::label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn empty_chain_passes() {
        assert!(RuleChain::new().evaluate().is_ok());
    }

    #[test]
    fn first_failure_wins() {
        let chain = RuleChain::new()
            .require(ViolationKind::Structural, "ok", || true)
            .require(ViolationKind::Asset, "first bad", || false)
            .require(ViolationKind::Timing, "second bad", || false);
        let err = chain.evaluate().unwrap_err();
        assert_eq!(err.kind(), ViolationKind::Asset);
        assert_eq!(err.reason(), "first bad");
    }

    #[test]
    fn later_predicates_are_not_evaluated() {
        let calls = Cell::new(0);
        let chain = RuleChain::new()
            .require(ViolationKind::Secret, "fails", || {
                calls.set(calls.get() + 1);
                false
            })
            .require(ViolationKind::Secret, "never runs", || {
                calls.set(calls.get() + 100);
                true
            });
        assert!(chain.evaluate().is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn then_appends_in_order() {
        let head = RuleChain::new().require(ViolationKind::Structural, "a", || true);
        let tail = RuleChain::new()
            .require(ViolationKind::Participant, "b", || true)
            .require(ViolationKind::Signature, "c", || false);
        let chain = head.then(tail);
        assert_eq!(chain.labels().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(chain.evaluate().unwrap_err().reason(), "c");
    }

    #[test]
    fn owned_labels_supported() {
        let code = "DOGE";
        let chain = RuleChain::new().require(
            ViolationKind::Asset,
            format!("asset {code} is not supported"),
            || false,
        );
        assert_eq!(
            chain.evaluate().unwrap_err().reason(),
            "asset DOGE is not supported"
        );
    }

    #[test]
    fn rule_debug_omits_predicate() {
        let chain = RuleChain::new().require(ViolationKind::Timing, "t", || true);
        let shown = format!("{chain:?}");
        assert!(shown.contains("Timing"));
        assert!(shown.contains("\"t\""));
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
    }
}
