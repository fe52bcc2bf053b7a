use std::any::Any;

use super::policy_set::{Evaluation, PolicyNode, PolicySet};
use super::{AssocType, AuthorizedContext, AuthzResult, CombiningAlgorithm, Effect};
use crate::config::AuthzConfig;

/// Root driver of one access-control check.
///
/// Owns a `DenyOverrides` root set that denies when no policy applies, the
/// deny messages collected during evaluation, and the authorized context the
/// policies populate. Build one per request and drop it afterwards.
#[derive(Debug)]
pub struct AuthorizationDecisionManager {
    root: PolicySet,
    messages: Vec<String>,
    context: AuthorizedContext,
}

impl Default for AuthorizationDecisionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationDecisionManager {
    pub fn new() -> Self {
        Self {
            root: PolicySet::new(CombiningAlgorithm::DenyOverrides),
            messages: Vec::new(),
            context: AuthorizedContext::new(),
        }
    }

    pub fn from_config(config: &AuthzConfig) -> AuthzResult<Self> {
        let mut manager = Self::new();
        manager.set_decision_if_no_policy_applies(config.default_decision)?;
        Ok(manager)
    }

    pub fn add_policy(&mut self, child: impl Into<PolicyNode>) {
        self.root.add(child);
    }

    /// Give `child` precedence over everything added so far
    pub fn add_policy_to_top(&mut self, child: impl Into<PolicyNode>) {
        self.root.add_to_top(child);
    }

    pub fn set_decision_if_no_policy_applies(&mut self, effect: Effect) -> AuthzResult<()> {
        self.root.set_effect_if_no_policy_applies(effect)
    }

    pub fn root(&self) -> &PolicySet {
        &self.root
    }

    /// Evaluate the policy tree.
    ///
    /// Starts from an empty authorized context and message list. When the
    /// result is `Deny` and the deciding branch carried a call-on-deny
    /// advice, that action runs exactly once before this returns.
    pub fn decide(&mut self) -> AuthzResult<Effect> {
        self.context.clear();
        self.messages.clear();

        let outcome = self.root.evaluate(&mut Evaluation {
            context: &mut self.context,
            messages: &mut self.messages,
        })?;
        debug_assert_ne!(outcome.effect, Effect::NotApplicable);

        tracing::debug!(
            effect = %outcome.effect,
            policies = self.root.len(),
            context_objects = self.context.len(),
            "authorization decided"
        );

        if outcome.effect == Effect::Deny {
            tracing::info!(messages = self.messages.len(), "authorization denied");
            if let Some(call_on_deny) = outcome.call_on_deny {
                tracing::debug!("running call-on-deny advice");
                call_on_deny.invoke();
            }
        }

        Ok(outcome.effect)
    }

    /// Deny messages in evaluation order, including ones from denials that
    /// were later overridden
    pub fn authorization_messages(&self) -> &[String] {
        &self.messages
    }

    pub fn authorized_context_object<T: Any>(&self, key: &AssocType) -> Option<&T> {
        self.context.get(key)
    }

    pub fn authorized_context(&self) -> &AuthorizedContext {
        &self.context
    }

    pub fn into_authorized_context(self) -> AuthorizedContext {
        self.context
    }
}
