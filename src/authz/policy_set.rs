use std::fmt;

use super::{
    AuthorizedContext, AuthzError, AuthzResult, CallOnDeny, CombiningAlgorithm, Effect, Policy,
};

/// A child of a policy set.
pub enum PolicyNode {
    Policy(Box<dyn Policy>),
    Set(PolicySet),
}

impl PolicyNode {
    pub fn policy(policy: impl Policy + 'static) -> Self {
        Self::Policy(Box::new(policy))
    }
}

impl<P: Policy + 'static> From<P> for PolicyNode {
    fn from(policy: P) -> Self {
        Self::Policy(Box::new(policy))
    }
}

impl From<PolicySet> for PolicyNode {
    fn from(set: PolicySet) -> Self {
        Self::Set(set)
    }
}

impl fmt::Debug for PolicyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyNode::Policy(policy) => write!(f, "Policy({})", policy.name()),
            PolicyNode::Set(set) => fmt::Debug::fmt(set, f),
        }
    }
}

/// Result of evaluating a set: the effect plus the call-on-deny advice of
/// the branch that short-circuited to `Deny`, if any.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub effect: Effect,
    pub call_on_deny: Option<CallOnDeny>,
}

/// Mutable state shared by every node of one evaluation pass
pub(crate) struct Evaluation<'a> {
    pub context: &'a mut AuthorizedContext,
    pub messages: &'a mut Vec<String>,
}

/// Ordered composite of policies and nested sets, folded with a combining algorithm.
pub struct PolicySet {
    algorithm: CombiningAlgorithm,
    effect_if_no_policy_applies: Effect,
    policies: Vec<PolicyNode>,
}

impl PolicySet {
    /// Empty set whose default is `Deny`
    pub fn new(algorithm: CombiningAlgorithm) -> Self {
        Self {
            algorithm,
            effect_if_no_policy_applies: Effect::Deny,
            policies: Vec::new(),
        }
    }

    pub fn with_default(algorithm: CombiningAlgorithm, default: Effect) -> AuthzResult<Self> {
        let mut set = Self::new(algorithm);
        set.set_effect_if_no_policy_applies(default)?;
        Ok(set)
    }

    /// Builder form of `add`
    pub fn with(mut self, child: impl Into<PolicyNode>) -> Self {
        self.add(child);
        self
    }

    pub fn add(&mut self, child: impl Into<PolicyNode>) {
        self.policies.push(child.into());
    }

    /// Insert ahead of every existing child so it is evaluated first
    pub fn add_to_top(&mut self, child: impl Into<PolicyNode>) {
        self.policies.insert(0, child.into());
    }

    pub fn set_effect_if_no_policy_applies(&mut self, effect: Effect) -> AuthzResult<()> {
        self.effect_if_no_policy_applies = effect.require_final("effect if no policy applies")?;
        Ok(())
    }

    pub fn effect_if_no_policy_applies(&self) -> Effect {
        self.effect_if_no_policy_applies
    }

    pub fn combining_algorithm(&self) -> CombiningAlgorithm {
        self.algorithm
    }

    pub fn policies(&self) -> &[PolicyNode] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub(crate) fn evaluate(&self, eval: &mut Evaluation<'_>) -> AuthzResult<Outcome> {
        let dominant = self.algorithm.dominant();
        let overridden = self.algorithm.overridden();
        let mut decided_by_overridden_effect = false;

        for child in &self.policies {
            let (effect, call_on_deny) = match child {
                PolicyNode::Policy(policy) => {
                    let name = policy.name();
                    let applies = policy
                        .applies(eval.context)
                        .map_err(|err| AuthzError::policy(name, err))?;
                    if !applies {
                        tracing::debug!(policy = %name, "policy not applicable");
                        continue;
                    }

                    let effect = policy
                        .effect(eval.context)
                        .map_err(|err| AuthzError::policy(name, err))?;
                    if effect == Effect::NotApplicable {
                        return Err(AuthzError::InvalidEffect {
                            policy: name.to_string(),
                            effect,
                        });
                    }
                    tracing::debug!(policy = %name, effect = %effect, "policy evaluated");

                    let advice = policy.advice();
                    let mut call_on_deny = None;
                    if effect == Effect::Deny {
                        // Messages are recorded even if a later sibling overrides this deny
                        if let Some(message) = advice.deny_message() {
                            eval.messages.push(message.to_string());
                        }
                        call_on_deny = advice.call_on_deny().cloned();
                    }
                    (effect, call_on_deny)
                }
                PolicyNode::Set(set) => {
                    let outcome = set.evaluate(eval)?;
                    (outcome.effect, outcome.call_on_deny)
                }
            };

            if effect == overridden {
                decided_by_overridden_effect = true;
                continue;
            }

            tracing::debug!(algorithm = %self.algorithm, effect = %dominant, "short-circuit");
            return Ok(Outcome {
                effect: dominant,
                call_on_deny: if dominant == Effect::Deny {
                    call_on_deny
                } else {
                    None
                },
            });
        }

        let effect = if decided_by_overridden_effect {
            overridden
        } else {
            self.effect_if_no_policy_applies
        };
        tracing::debug!(algorithm = %self.algorithm, effect = %effect, "policy set decided");

        Ok(Outcome {
            effect,
            call_on_deny: None,
        })
    }
}

impl fmt::Debug for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySet")
            .field("algorithm", &self.algorithm)
            .field(
                "effect_if_no_policy_applies",
                &self.effect_if_no_policy_applies,
            )
            .field("policies", &self.policies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{Advice, FnPolicy};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn run(set: &PolicySet) -> (Outcome, Vec<String>, AuthorizedContext) {
        let mut context = AuthorizedContext::new();
        let mut messages = Vec::new();
        let outcome = set
            .evaluate(&mut Evaluation {
                context: &mut context,
                messages: &mut messages,
            })
            .unwrap();
        (outcome, messages, context)
    }

    fn counted(name: &str, effect: Effect, calls: &Arc<AtomicUsize>) -> FnPolicy {
        let calls = calls.clone();
        FnPolicy::new(name, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(effect)
        })
    }

    #[test]
    fn test_empty_set_returns_default() {
        let set =
            PolicySet::with_default(CombiningAlgorithm::PermitOverrides, Effect::Permit).unwrap();
        assert_eq!(run(&set).0.effect, Effect::Permit);

        let set = PolicySet::new(CombiningAlgorithm::DenyOverrides);
        assert_eq!(run(&set).0.effect, Effect::Deny);
    }

    #[test]
    fn test_not_applicable_default_rejected() {
        let err = PolicySet::with_default(CombiningAlgorithm::DenyOverrides, Effect::NotApplicable)
            .unwrap_err();
        assert!(matches!(err, AuthzError::Configuration(_)));
    }

    #[test]
    fn test_deny_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let set = PolicySet::new(CombiningAlgorithm::DenyOverrides)
            .with(counted("first", Effect::Permit, &calls))
            .with(counted("second", Effect::Deny, &calls))
            .with(counted("third", Effect::Permit, &calls));

        assert_eq!(run(&set).0.effect, Effect::Deny);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_overridden_effect_wins_when_nothing_dominates() {
        let set = PolicySet::with_default(CombiningAlgorithm::PermitOverrides, Effect::Permit)
            .unwrap()
            .with(FnPolicy::fixed("deny", Effect::Deny));

        assert_eq!(run(&set).0.effect, Effect::Deny);
    }

    #[test]
    fn test_not_applicable_child_never_asked_for_effect() {
        let calls = Arc::new(AtomicUsize::new(0));
        let set = PolicySet::with_default(CombiningAlgorithm::DenyOverrides, Effect::Permit)
            .unwrap()
            .with(counted("skipped", Effect::Deny, &calls).when(|_| Ok(false)));

        assert_eq!(run(&set).0.effect, Effect::Permit);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_add_to_top_changes_order() {
        let mut set = PolicySet::new(CombiningAlgorithm::DenyOverrides);
        set.add(FnPolicy::fixed("a", Effect::Permit));
        set.add_to_top(FnPolicy::fixed("b", Effect::Permit));

        let names: Vec<String> = set
            .policies()
            .iter()
            .map(|node| format!("{node:?}"))
            .collect();
        assert_eq!(names, vec!["Policy(b)", "Policy(a)"]);
    }

    #[test]
    fn test_not_applicable_effect_is_an_error() {
        let set = PolicySet::new(CombiningAlgorithm::DenyOverrides)
            .with(FnPolicy::fixed("broken", Effect::NotApplicable));
        let mut context = AuthorizedContext::new();
        let mut messages = Vec::new();

        let err = set
            .evaluate(&mut Evaluation {
                context: &mut context,
                messages: &mut messages,
            })
            .unwrap_err();
        assert!(matches!(err, AuthzError::InvalidEffect { .. }));
    }

    #[test]
    fn test_overridden_deny_still_records_message() {
        let set = PolicySet::new(CombiningAlgorithm::PermitOverrides)
            .with(
                FnPolicy::fixed("deny", Effect::Deny)
                    .with_advice(Advice::new().with_deny_message("not yours")),
            )
            .with(FnPolicy::fixed("permit", Effect::Permit));

        let (outcome, messages, _) = run(&set);
        assert_eq!(outcome.effect, Effect::Permit);
        assert_eq!(messages, vec!["not yours".to_string()]);
    }

    #[test]
    fn test_call_on_deny_not_carried_through_permit_overrides() {
        let advice = Advice::new().with_call_on_deny(CallOnDeny::new(|| {}));
        let inner = PolicySet::new(CombiningAlgorithm::DenyOverrides)
            .with(FnPolicy::fixed("deny", Effect::Deny).with_advice(advice));
        let middle = PolicySet::new(CombiningAlgorithm::PermitOverrides).with(inner);
        let root = PolicySet::new(CombiningAlgorithm::DenyOverrides).with(middle);

        let (outcome, _, _) = run(&root);
        assert_eq!(outcome.effect, Effect::Deny);
        assert!(outcome.call_on_deny.is_none());
    }
}
