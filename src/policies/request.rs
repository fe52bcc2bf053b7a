use std::sync::Arc;

use crate::authz::{Advice, AssocType, AuthorizedContext, Effect, Policy, RequestContext};

/// Deny requests that are not scoped to a journal/press context.
///
/// On permit the context id is published under `AssocType::Context`.
#[derive(Debug)]
pub struct ContextRequiredPolicy {
    request: Arc<RequestContext>,
    advice: Advice,
}

impl ContextRequiredPolicy {
    pub fn new(request: Arc<RequestContext>) -> Self {
        Self {
            request,
            advice: Advice::new().with_deny_message("a context is required for this operation"),
        }
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }
}

impl Policy for ContextRequiredPolicy {
    fn name(&self) -> &str {
        "context_required"
    }

    fn effect(&self, ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        match self.request.context_id {
            Some(context_id) => {
                ctx.insert(AssocType::Context, context_id);
                Ok(Effect::Permit)
            }
            None => Ok(Effect::Deny),
        }
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}

/// Deny plain-HTTP requests while HTTPS is enforced.
///
/// Not applicable at all when HTTPS is not enforced. Typically carries a
/// call-on-deny advice that sends the client to the HTTPS URL.
#[derive(Debug)]
pub struct HttpsPolicy {
    request: Arc<RequestContext>,
    force_ssl: bool,
    advice: Advice,
}

impl HttpsPolicy {
    pub fn new(request: Arc<RequestContext>, force_ssl: bool) -> Self {
        Self {
            request,
            force_ssl,
            advice: Advice::default(),
        }
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }
}

impl Policy for HttpsPolicy {
    fn name(&self) -> &str {
        "https"
    }

    fn applies(&self, _ctx: &AuthorizedContext) -> anyhow::Result<bool> {
        Ok(self.force_ssl)
    }

    fn effect(&self, _ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        Ok(if self.request.secure {
            Effect::Permit
        } else {
            Effect::Deny
        })
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}
