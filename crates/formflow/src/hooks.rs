//! Lifecycle hooks
//!
//! Hooks are async callbacks bound to one [`HookPhase`] of a form. Each
//! phase keeps its hooks in registration order and lists only ever grow.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::SubmitError;
use crate::transport::{Payload, ServerReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookPhase {
    BeforeValidate,
    AfterValidate,
    BeforeSubmit,
    AfterSubmit,
    OnSuccess,
    OnError,
}

impl HookPhase {
    pub const ALL: [HookPhase; 6] = [
        HookPhase::BeforeValidate,
        HookPhase::AfterValidate,
        HookPhase::BeforeSubmit,
        HookPhase::AfterSubmit,
        HookPhase::OnSuccess,
        HookPhase::OnError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::BeforeValidate => "before-validate",
            HookPhase::AfterValidate => "after-validate",
            HookPhase::BeforeSubmit => "before-submit",
            HookPhase::AfterSubmit => "after-submit",
            HookPhase::OnSuccess => "on-success",
            HookPhase::OnError => "on-error",
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookPhase {
    type Err = String;

    /// Accepts kebab-case (`before-submit`) and camelCase (`beforeSubmit`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "beforevalidate" => Ok(HookPhase::BeforeValidate),
            "aftervalidate" => Ok(HookPhase::AfterValidate),
            "beforesubmit" => Ok(HookPhase::BeforeSubmit),
            "aftersubmit" => Ok(HookPhase::AfterSubmit),
            "onsuccess" => Ok(HookPhase::OnSuccess),
            "onerror" => Ok(HookPhase::OnError),
            _ => Err(format!("unknown hook phase: {s}")),
        }
    }
}

/// Field state handed to validation hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    pub key: String,
    /// Trimmed value being validated
    pub value: String,
    pub dirty: bool,
    pub valid: bool,
}

/// What a hook is told, one variant per phase
#[derive(Debug, Clone)]
pub enum HookContext {
    BeforeValidate {
        form_id: String,
        field: FieldSnapshot,
    },
    AfterValidate {
        form_id: String,
        field: FieldSnapshot,
        valid: bool,
        message: Option<String>,
    },
    BeforeSubmit {
        form_id: String,
        payload: Payload,
    },
    AfterSubmit {
        form_id: String,
        reply: ServerReply,
    },
    OnSuccess {
        form_id: String,
        payload: Payload,
        reply: ServerReply,
    },
    OnError {
        form_id: String,
        error: Arc<SubmitError>,
    },
}

impl HookContext {
    pub fn phase(&self) -> HookPhase {
        match self {
            HookContext::BeforeValidate { .. } => HookPhase::BeforeValidate,
            HookContext::AfterValidate { .. } => HookPhase::AfterValidate,
            HookContext::BeforeSubmit { .. } => HookPhase::BeforeSubmit,
            HookContext::AfterSubmit { .. } => HookPhase::AfterSubmit,
            HookContext::OnSuccess { .. } => HookPhase::OnSuccess,
            HookContext::OnError { .. } => HookPhase::OnError,
        }
    }

    pub fn form_id(&self) -> &str {
        match self {
            HookContext::BeforeValidate { form_id, .. }
            | HookContext::AfterValidate { form_id, .. }
            | HookContext::BeforeSubmit { form_id, .. }
            | HookContext::AfterSubmit { form_id, .. }
            | HookContext::OnSuccess { form_id, .. }
            | HookContext::OnError { form_id, .. } => form_id,
        }
    }
}

/// A lifecycle callback.
///
/// Implemented for any `Fn(HookContext) -> impl Future<Output = anyhow::Result<()>>`,
/// so closures work directly:
///
/// ```rust,ignore
/// pipeline
///     .add_hook("contact", HookPhase::OnSuccess, |ctx: HookContext| async move {
///         tracing::info!(form = ctx.form_id(), "sent");
///         anyhow::Ok(())
///     })
///     .await?;
/// ```
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, context: HookContext) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> Hook for F
where
    F: Fn(HookContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn call(&self, context: HookContext) -> anyhow::Result<()> {
        (self)(context).await
    }
}

/// Per-form hook lists keyed by phase
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<HookPhase, Vec<Arc<dyn Hook>>>,
}

impl HookRegistry {
    pub fn push(&mut self, phase: HookPhase, hook: Arc<dyn Hook>) {
        self.hooks.entry(phase).or_default().push(hook);
    }

    /// Hooks of one phase, cloned out so they can run without holding locks
    pub fn for_phase(&self, phase: HookPhase) -> Vec<Arc<dyn Hook>> {
        self.hooks.get(&phase).cloned().unwrap_or_default()
    }

    pub fn len(&self, phase: HookPhase) -> usize {
        self.hooks.get(&phase).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for phase in HookPhase::ALL {
            map.entry(&phase.as_str(), &self.len(phase));
        }
        map.finish()
    }
}

/// Run every hook in order; failures are logged and do not stop the rest
pub async fn run_tolerant(hooks: &[Arc<dyn Hook>], context: HookContext) {
    for hook in hooks {
        if let Err(e) = hook.call(context.clone()).await {
            tracing::error!(
                phase = %context.phase(),
                form = context.form_id(),
                "Hook execution error: {e:#}"
            );
        }
    }
}

/// Run hooks in order, stopping at the first failure
pub async fn run_strict(hooks: &[Arc<dyn Hook>], context: HookContext) -> anyhow::Result<()> {
    for hook in hooks {
        hook.call(context.clone()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &'static str, fail: bool) -> Arc<dyn Hook> {
        let log = log.clone();
        Arc::new(move |_ctx: HookContext| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(label.to_string());
                if fail {
                    anyhow::bail!("{label} failed");
                }
                Ok(())
            }
        })
    }

    fn context() -> HookContext {
        HookContext::BeforeSubmit {
            form_id: "contact".into(),
            payload: Payload::new(),
        }
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!("before-validate".parse::<HookPhase>(), Ok(HookPhase::BeforeValidate));
        assert_eq!("onSuccess".parse::<HookPhase>(), Ok(HookPhase::OnSuccess));
        assert_eq!("after_submit".parse::<HookPhase>(), Ok(HookPhase::AfterSubmit));
        assert!("during-submit".parse::<HookPhase>().is_err());
        for phase in HookPhase::ALL {
            assert_eq!(phase.as_str().parse::<HookPhase>(), Ok(phase));
        }
    }

    #[test]
    fn test_context_phase() {
        let ctx = context();
        assert_eq!(ctx.phase(), HookPhase::BeforeSubmit);
        assert_eq!(ctx.form_id(), "contact");
    }

    #[tokio::test]
    async fn test_tolerant_runs_all_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = vec![
            recorder(&log, "first", false),
            recorder(&log, "second", true),
            recorder(&log, "third", false),
        ];

        run_tolerant(&hooks, context()).await;

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_strict_stops_at_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = vec![
            recorder(&log, "first", false),
            recorder(&log, "second", true),
            recorder(&log, "third", false),
        ];

        let err = run_strict(&hooks, context()).await.unwrap_err();

        assert_eq!(err.to_string(), "second failed");
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_registry_is_append_only_per_phase() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HookRegistry::default();
        registry.push(HookPhase::OnError, recorder(&log, "a", false));
        registry.push(HookPhase::OnError, recorder(&log, "b", false));

        assert_eq!(registry.len(HookPhase::OnError), 2);
        assert_eq!(registry.len(HookPhase::OnSuccess), 0);
        assert!(registry.for_phase(HookPhase::BeforeValidate).is_empty());
    }
}
