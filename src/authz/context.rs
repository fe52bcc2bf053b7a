use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key under which a policy publishes an object it resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssocType {
    Context,
    Submission,
    Publication,
    ReviewAssignment,
    SubmissionFile,
    Query,
    UserGroup,
    UserRoles,
    AccessibleWorkflowStages,
    /// Application-defined key outside the well-known set
    Custom(String),
}

impl AssocType {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for AssocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssocType::Context => f.write_str("context"),
            AssocType::Submission => f.write_str("submission"),
            AssocType::Publication => f.write_str("publication"),
            AssocType::ReviewAssignment => f.write_str("review_assignment"),
            AssocType::SubmissionFile => f.write_str("submission_file"),
            AssocType::Query => f.write_str("query"),
            AssocType::UserGroup => f.write_str("user_group"),
            AssocType::UserRoles => f.write_str("user_roles"),
            AssocType::AccessibleWorkflowStages => f.write_str("accessible_workflow_stages"),
            AssocType::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// Objects discovered by policies during one decision.
///
/// A single instance is owned by the decision manager and lent to every
/// policy in evaluation order, so a write made by one policy is visible to
/// every policy evaluated after it in the same `decide()` call.
#[derive(Default)]
pub struct AuthorizedContext {
    objects: HashMap<AssocType, Box<dyn Any + Send + Sync>>,
}

impl AuthorizedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, replacing whatever was under `key`
    pub fn insert<T: Any + Send + Sync>(&mut self, key: AssocType, value: T) {
        tracing::trace!(key = %key, "authorized context object added");
        self.objects.insert(key, Box::new(value));
    }

    /// Typed lookup; `None` when the key is absent or holds another type
    pub fn get<T: Any>(&self, key: &AssocType) -> Option<&T> {
        self.objects
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains(&self, key: &AssocType) -> bool {
        self.objects.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &AssocType> {
        self.objects.keys()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.objects.clear();
    }
}

impl fmt::Debug for AuthorizedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.objects.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_get() {
        let mut ctx = AuthorizedContext::new();
        ctx.insert(AssocType::Submission, 42_u64);

        assert_eq!(ctx.get::<u64>(&AssocType::Submission), Some(&42));
        // wrong type reads as absent
        assert!(ctx.get::<String>(&AssocType::Submission).is_none());
        assert!(ctx.get::<u64>(&AssocType::Publication).is_none());
    }

    #[test]
    fn test_overwrite_is_allowed() {
        let mut ctx = AuthorizedContext::new();
        ctx.insert(AssocType::custom("stage"), 1_u8);
        ctx.insert(AssocType::custom("stage"), 3_u8);

        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get::<u8>(&AssocType::custom("stage")), Some(&3));
    }

    #[test]
    fn test_custom_keys_are_distinct() {
        let mut ctx = AuthorizedContext::new();
        ctx.insert(AssocType::custom("a"), "x".to_string());

        assert!(ctx.contains(&AssocType::custom("a")));
        assert!(!ctx.contains(&AssocType::custom("b")));
        assert_eq!(AssocType::custom("a").to_string(), "custom:a");
    }
}
