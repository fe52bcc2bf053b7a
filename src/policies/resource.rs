use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::authz::{Advice, AssocType, AuthorizedContext, Effect, Policy, Principal, RequestContext};

/// Resource with a single owning user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

type LookupFn<T> = Box<dyn Fn(Uuid) -> anyhow::Result<Option<T>> + Send>;

/// Resolve the resource named by the request and publish it under `key`.
///
/// Denies when the request names no resource or the lookup finds nothing.
/// Lookup errors abort the decision.
pub struct ResourceRequiredPolicy<T> {
    request: Arc<RequestContext>,
    key: AssocType,
    lookup: LookupFn<T>,
    advice: Advice,
}

impl<T: Any + Send + Sync> ResourceRequiredPolicy<T> {
    pub fn new(
        request: Arc<RequestContext>,
        key: AssocType,
        lookup: impl Fn(Uuid) -> anyhow::Result<Option<T>> + Send + 'static,
    ) -> Self {
        Self {
            request,
            key,
            lookup: Box::new(lookup),
            advice: Advice::default(),
        }
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }
}

impl<T: Any + Send + Sync> Policy for ResourceRequiredPolicy<T> {
    fn name(&self) -> &str {
        "resource_required"
    }

    fn effect(&self, ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        let Some(resource_id) = self.request.resource_id else {
            return Ok(Effect::Deny);
        };

        match (self.lookup)(resource_id)? {
            Some(resource) => {
                ctx.insert(self.key.clone(), resource);
                Ok(Effect::Permit)
            }
            None => {
                tracing::debug!(key = %self.key, %resource_id, "resource not found");
                Ok(Effect::Deny)
            }
        }
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}

impl<T> fmt::Debug for ResourceRequiredPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRequiredPolicy")
            .field("key", &self.key)
            .field("resource_id", &self.request.resource_id)
            .finish()
    }
}

/// Permit when the object an earlier policy published under `key` belongs
/// to the principal.
pub struct OwnershipPolicy<T> {
    principal: Arc<Principal>,
    key: AssocType,
    advice: Advice,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Owned + Any> OwnershipPolicy<T> {
    pub fn new(principal: Arc<Principal>, key: AssocType) -> Self {
        Self {
            principal,
            key,
            advice: Advice::default(),
            _resource: PhantomData,
        }
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }
}

impl<T: Owned + Any> Policy for OwnershipPolicy<T> {
    fn name(&self) -> &str {
        "ownership"
    }

    fn effect(&self, ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        let Some(resource) = ctx.get::<T>(&self.key) else {
            tracing::debug!(key = %self.key, "no resolved object to check ownership against");
            return Ok(Effect::Deny);
        };

        if resource.owner_id() == self.principal.user_id {
            Ok(Effect::Permit)
        } else {
            Ok(Effect::Deny)
        }
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}

impl<T> fmt::Debug for OwnershipPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipPolicy")
            .field("user_id", &self.principal.user_id)
            .field("key", &self.key)
            .finish()
    }
}

/// Deny unless an earlier policy published an object under `key`
#[derive(Debug)]
pub struct AuthorizedContextRequiredPolicy {
    key: AssocType,
    advice: Advice,
}

impl AuthorizedContextRequiredPolicy {
    pub fn new(key: AssocType) -> Self {
        Self {
            key,
            advice: Advice::default(),
        }
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }
}

impl Policy for AuthorizedContextRequiredPolicy {
    fn name(&self) -> &str {
        "authorized_context_required"
    }

    fn effect(&self, ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        Ok(if ctx.contains(&self.key) {
            Effect::Permit
        } else {
            Effect::Deny
        })
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Submission {
        id: Uuid,
        submitter: Uuid,
    }

    impl Owned for Submission {
        fn owner_id(&self) -> Uuid {
            self.submitter
        }
    }

    #[test]
    fn test_resource_required_publishes_object() {
        let id = Uuid::new_v4();
        let submitter = Uuid::new_v4();
        let request = RequestContext::new("submission.view").with_resource("submission", id);
        let request = Arc::new(request);
        let policy = ResourceRequiredPolicy::new(request, AssocType::Submission, move |lookup_id| {
            Ok(Some(Submission {
                id: lookup_id,
                submitter,
            }))
        });
        let mut ctx = AuthorizedContext::new();

        assert_eq!(policy.effect(&mut ctx).unwrap(), Effect::Permit);
        assert_eq!(
            ctx.get::<Submission>(&AssocType::Submission).map(|s| s.id),
            Some(id)
        );
    }

    #[test]
    fn test_resource_required_denies_without_id_or_match() {
        let no_id = ResourceRequiredPolicy::<Submission>::new(
            Arc::new(RequestContext::new("submission.view")),
            AssocType::Submission,
            |_| panic!("lookup must not run without a resource id"),
        );
        assert_eq!(
            no_id.effect(&mut AuthorizedContext::new()).unwrap(),
            Effect::Deny
        );

        let missing = ResourceRequiredPolicy::<Submission>::new(
            Arc::new(
                RequestContext::new("submission.view").with_resource("submission", Uuid::new_v4()),
            ),
            AssocType::Submission,
            |_| Ok(None),
        );
        let mut ctx = AuthorizedContext::new();
        assert_eq!(missing.effect(&mut ctx).unwrap(), Effect::Deny);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_ownership() {
        let owner = Arc::new(Principal::new(Uuid::new_v4()));
        let stranger = Arc::new(Principal::new(Uuid::new_v4()));
        let mut ctx = AuthorizedContext::new();
        ctx.insert(
            AssocType::Submission,
            Submission {
                id: Uuid::new_v4(),
                submitter: owner.user_id,
            },
        );

        let check = OwnershipPolicy::<Submission>::new(owner, AssocType::Submission);
        assert_eq!(check.effect(&mut ctx).unwrap(), Effect::Permit);

        let check = OwnershipPolicy::<Submission>::new(stranger.clone(), AssocType::Submission);
        assert_eq!(check.effect(&mut ctx).unwrap(), Effect::Deny);

        let check = OwnershipPolicy::<Submission>::new(stranger, AssocType::Publication);
        assert_eq!(check.effect(&mut ctx).unwrap(), Effect::Deny);
    }

    #[test]
    fn test_authorized_context_required() {
        let policy = AuthorizedContextRequiredPolicy::new(AssocType::UserGroup);
        let mut ctx = AuthorizedContext::new();
        assert_eq!(policy.effect(&mut ctx).unwrap(), Effect::Deny);

        ctx.insert(AssocType::UserGroup, 7_u32);
        assert_eq!(policy.effect(&mut ctx).unwrap(), Effect::Permit);
    }
}
