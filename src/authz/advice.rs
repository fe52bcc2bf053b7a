use std::fmt;
use std::sync::Arc;

/// The two advice slots a policy may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdviceKind {
    DenyMessage,
    CallOnDeny,
}

/// Deferred zero-argument action run by the decision manager after a final `Deny`.
#[derive(Clone)]
pub struct CallOnDeny(Arc<dyn Fn() + Send + Sync>);

impl CallOnDeny {
    pub fn new(action: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(action))
    }

    pub(crate) fn invoke(&self) {
        (self.0)()
    }
}

impl fmt::Debug for CallOnDeny {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallOnDeny(..)")
    }
}

/// Side-channel payload attached to a policy at construction.
#[derive(Debug, Clone, Default)]
pub struct Advice {
    deny_message: Option<String>,
    call_on_deny: Option<CallOnDeny>,
}

static NO_ADVICE: Advice = Advice {
    deny_message: None,
    call_on_deny: None,
};

impl Advice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared empty advice for policies that declare none
    pub fn none() -> &'static Advice {
        &NO_ADVICE
    }

    pub fn with_deny_message(mut self, message: impl Into<String>) -> Self {
        self.deny_message = Some(message.into());
        self
    }

    pub fn with_call_on_deny(mut self, action: CallOnDeny) -> Self {
        self.call_on_deny = Some(action);
        self
    }

    pub fn has(&self, kind: AdviceKind) -> bool {
        match kind {
            AdviceKind::DenyMessage => self.deny_message.is_some(),
            AdviceKind::CallOnDeny => self.call_on_deny.is_some(),
        }
    }

    pub fn deny_message(&self) -> Option<&str> {
        self.deny_message.as_deref()
    }

    pub fn call_on_deny(&self) -> Option<&CallOnDeny> {
        self.call_on_deny.as_ref()
    }
}
