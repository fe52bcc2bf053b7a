use super::{Advice, AuthorizedContext, Effect};

/// Leaf evaluator for one access-control concern.
///
/// A policy is built for a single decision and consulted at most once:
/// `applies()` first, then `effect()` only if it applied. Errors are not
/// caught by the engine; they abort `decide()`.
pub trait Policy: Send {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        "policy"
    }

    /// Whether the policy is relevant to the current request. Must be cheap
    /// and side-effect free.
    fn applies(&self, _ctx: &AuthorizedContext) -> anyhow::Result<bool> {
        Ok(true)
    }

    /// Must return `Permit` or `Deny`. May publish objects into `ctx`.
    fn effect(&self, _ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        Ok(Effect::Deny)
    }

    fn advice(&self) -> &Advice {
        Advice::none()
    }
}

type AppliesFn = Box<dyn Fn(&AuthorizedContext) -> anyhow::Result<bool> + Send>;
type EffectFn = Box<dyn Fn(&mut AuthorizedContext) -> anyhow::Result<Effect> + Send>;

/// Policy assembled from closures, for checks too small to deserve a type.
pub struct FnPolicy {
    name: String,
    applies: Option<AppliesFn>,
    effect: EffectFn,
    advice: Advice,
}

impl FnPolicy {
    pub fn new(
        name: impl Into<String>,
        effect: impl Fn(&mut AuthorizedContext) -> anyhow::Result<Effect> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            applies: None,
            effect: Box::new(effect),
            advice: Advice::default(),
        }
    }

    /// Policy that always yields `effect`
    pub fn fixed(name: impl Into<String>, effect: Effect) -> Self {
        Self::new(name, move |_| Ok(effect))
    }

    pub fn when(
        mut self,
        applies: impl Fn(&AuthorizedContext) -> anyhow::Result<bool> + Send + 'static,
    ) -> Self {
        self.applies = Some(Box::new(applies));
        self
    }

    pub fn with_advice(mut self, advice: Advice) -> Self {
        self.advice = advice;
        self
    }
}

impl Policy for FnPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies(&self, ctx: &AuthorizedContext) -> anyhow::Result<bool> {
        match &self.applies {
            Some(applies) => applies(ctx),
            None => Ok(true),
        }
    }

    fn effect(&self, ctx: &mut AuthorizedContext) -> anyhow::Result<Effect> {
        (self.effect)(ctx)
    }

    fn advice(&self) -> &Advice {
        &self.advice
    }
}

impl std::fmt::Debug for FnPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPolicy")
            .field("name", &self.name)
            .field("conditional", &self.applies.is_some())
            .field("advice", &self.advice)
            .finish()
    }
}
