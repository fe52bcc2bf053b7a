//! JSON policy documents.
//!
//! A document describes a decision tree of static policies, which is handy
//! for exercising combining rules from the command line or from fixtures:
//!
//! ```json
//! {
//!   "default": "deny",
//!   "policies": [
//!     { "policy": { "name": "ssl", "applies": false, "effect": "deny" } },
//!     { "set": {
//!         "algorithm": "permit_overrides",
//!         "children": [
//!           { "policy": { "name": "author", "effect": "deny",
//!                         "deny_message": "not the author" } },
//!           { "policy": { "name": "editor", "effect": "permit",
//!                         "writes": [{ "key": "user_group", "value": 3 }] } }
//!         ]
//!     } }
//!   ]
//! }
//! ```

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::authz::{
    Advice, AssocType, AuthorizationDecisionManager, AuthorizedContext, AuthzError, AuthzResult,
    CallOnDeny, CombiningAlgorithm, Effect, Policy, PolicyNode, PolicySet,
};

fn deny() -> Effect {
    Effect::Deny
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    /// Root decision when no policy applies
    #[serde(default = "deny")]
    pub default: Effect,
    #[serde(default)]
    pub policies: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSpec {
    Policy(StaticPolicySpec),
    Set(PolicySetSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySetSpec {
    pub algorithm: CombiningAlgorithm,
    #[serde(default = "deny")]
    pub default: Effect,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
    #[serde(default)]
    pub add_to_top: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticPolicySpec {
    pub name: String,
    #[serde(default = "yes")]
    pub applies: bool,
    pub effect: Effect,
    #[serde(default)]
    pub deny_message: Option<String>,
    /// Label recorded in the fired-advice log when this policy's call-on-deny runs
    #[serde(default)]
    pub call_on_deny: Option<String>,
    /// Context keys that must already be present, otherwise the policy denies
    #[serde(default)]
    pub requires: Vec<AssocType>,
    /// Objects added to the authorized context when the policy is evaluated
    #[serde(default)]
    pub writes: Vec<ContextWrite>,
    #[serde(default)]
    pub add_to_top: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextWrite {
    pub key: AssocType,
    pub value: Value,
}

/// Labels of the call-on-deny advice that ran, in order
#[derive(Debug, Clone, Default)]
pub struct FiredAdvice(Arc<Mutex<Vec<String>>>);

impl FiredAdvice {
    fn record(&self, label: &str) {
        let mut fired = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        fired.push(label.to_string());
    }

    pub fn labels(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Leaf built from a `StaticPolicySpec`
#[derive(Debug)]
pub struct StaticPolicy {
    spec: StaticPolicySpec,
    advice: Advice,
}

impl StaticPolicy {
    fn build(spec: StaticPolicySpec, fired: &FiredAdvice) -> AuthzResult<Self> {
        spec.effect
            .require_final(&format!("effect of policy `{}`", spec.name))?;

        let mut advice = Advice::new();
        if let Some(message) = &spec.deny_message {
            advice = advice.with_deny_message(message.clone());
        }
        if let Some(label) = &spec.call_on_deny {
            let fired = fired.clone();
            let label = label.clone();
            advice = advice.with_call_on_deny(CallOnDeny::new(move || fired.record(&label)));
        }

        Ok(Self { spec, advice })
    }
}

impl Policy for StaticPolicy {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn applies(&self, _ctx: &AuthorizedContext) -> anyhow::Result<bool> {
        Ok(self.spec.applies)
    }

    fn effect(&self, ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        if let Some(missing) = self.spec.requires.iter().find(|key| !ctx.contains(key)) {
            tracing::debug!(
                policy = %self.spec.name,
                key = %missing,
                "required context object missing"
            );
            return Ok(Effect::Deny);
        }

        for write in &self.spec.writes {
            ctx.insert(write.key.clone(), write.value.clone());
        }
        Ok(self.spec.effect)
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}

impl PolicyDocument {
    pub fn from_json(input: &str) -> AuthzResult<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(input);
        serde_path_to_error::deserialize(deserializer).map_err(|err| AuthzError::Document {
            path: err.path().to_string(),
            message: err.inner().to_string(),
        })
    }

    /// Build a decision manager for the document plus the log its
    /// call-on-deny advice writes to
    pub fn build(&self) -> AuthzResult<(AuthorizationDecisionManager, FiredAdvice)> {
        let fired = FiredAdvice::default();
        let mut manager = AuthorizationDecisionManager::new();
        manager.set_decision_if_no_policy_applies(self.default)?;

        for node in &self.policies {
            let (child, to_top) = build_node(node, &fired)?;
            if to_top {
                manager.add_policy_to_top(child);
            } else {
                manager.add_policy(child);
            }
        }

        Ok((manager, fired))
    }
}

fn build_node(node: &NodeSpec, fired: &FiredAdvice) -> AuthzResult<(PolicyNode, bool)> {
    match node {
        NodeSpec::Policy(spec) => {
            let policy = StaticPolicy::build(spec.clone(), fired)?;
            Ok((PolicyNode::policy(policy), spec.add_to_top))
        }
        NodeSpec::Set(spec) => {
            let mut set = PolicySet::with_default(spec.algorithm, spec.default)?;
            for child in &spec.children {
                let (child, to_top) = build_node(child, fired)?;
                if to_top {
                    set.add_to_top(child);
                } else {
                    set.add(child);
                }
            }
            Ok((PolicyNode::Set(set), spec.add_to_top))
        }
    }
}
