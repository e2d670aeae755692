//! Error boundary for plugin-scoped operations.
//!
//! Every call into plugin code (hook invocations, pre-load migration
//! steps) runs through [`guard`], so a single plugin's internal fault
//! can never masquerade as a different plugin's fault or crash the
//! host process.

use std::future::Future;

use tracing::{debug, error};

use crate::error::{BoxError, PluginError};

/// Runs a plugin-scoped async operation, attributing any failure to the
/// named plugin.
///
/// On success the result passes through unchanged. On failure the
/// underlying error is logged with the plugin identity and re-signaled
/// as the typed [`PluginError`] built by `attribute`, which receives
/// the original error's message and the error itself as the source —
/// the caller never sees the bare underlying error.
pub async fn guard<T, Fut, A>(
    plugin: &str,
    context: &str,
    fut: Fut,
    attribute: A,
) -> Result<T, PluginError>
where
    Fut: Future<Output = Result<T, BoxError>>,
    A: FnOnce(String, BoxError) -> PluginError,
{
    match fut.await {
        Ok(value) => {
            debug!(plugin = %plugin, context = %context, "plugin call completed");
            Ok(value)
        }
        Err(source) => {
            error!(
                plugin = %plugin,
                context = %context,
                error = %source,
                "plugin call failed"
            );
            let message = source.to_string();
            Err(attribute(message, source))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookKind;

    #[tokio::test]
    async fn success_passes_through_unchanged() {
        let result = guard(
            "telegram",
            "setup",
            async { Ok::<_, BoxError>(42) },
            |message, source| PluginError::HookFailed {
                plugin: "telegram".to_string(),
                hook: HookKind::Setup,
                message,
                source,
            },
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn failure_is_attributed_to_the_plugin() {
        let result: Result<(), PluginError> = guard(
            "telegram",
            "setup",
            async { Err::<(), BoxError>("token missing".into()) },
            |message, source| PluginError::HookFailed {
                plugin: "telegram".to_string(),
                hook: HookKind::Setup,
                message,
                source,
            },
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.plugin(), Some("telegram"));
        assert!(err.to_string().contains("token missing"));
        // The original error survives as the source for diagnostics.
        assert!(std::error::Error::source(&err).is_some());
    }
}
