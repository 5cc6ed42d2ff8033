use std::time::{Duration, Instant};

use crate::browser::BrowserSession;
use crate::error::{NotepubError, Result};

/// Poll a readiness expression on the active page until it yields a truthy
/// value, or fail with a timeout. This is the one wait primitive the
/// automation uses: element appearance, document readiness, and URL changes
/// are all expressed as predicates over it.
///
/// `null` and `false` results mean not-ready; any other value resolves the
/// wait and is returned to the caller.
pub async fn await_condition(
    session: &BrowserSession,
    expression: &str,
    timeout: Duration,
    interval: Duration,
    what: &str,
) -> Result<serde_json::Value> {
    let start = Instant::now();

    loop {
        match session.eval(expression).await {
            Ok(value) => {
                let ready = match &value {
                    serde_json::Value::Null => false,
                    serde_json::Value::Bool(b) => *b,
                    _ => true,
                };
                if ready {
                    return Ok(value);
                }
            }
            // The page WebSocket drops and the execution context is torn down
            // while a navigation is in flight; both read as not-ready here.
            Err(NotepubError::CdpConnectionFailed(e)) => {
                tracing::trace!("eval unavailable while waiting for {}: {}", what, e);
            }
            Err(NotepubError::JavaScriptError(e)) => {
                tracing::trace!("eval failed while waiting for {}: {}", what, e);
            }
            Err(e) => return Err(e),
        }

        if start.elapsed() >= timeout {
            return Err(NotepubError::Timeout(format!(
                "{} not ready within {}ms",
                what,
                timeout.as_millis()
            )));
        }

        tokio::time::sleep(interval).await;
    }
}
