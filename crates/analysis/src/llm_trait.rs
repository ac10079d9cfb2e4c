use async_trait::async_trait;
use cntube_common::{CntubeError, Result};
use std::future::Future;
use tracing::warn;

/// Common trait for chat/embedding backends
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Backend name for logging ("ollama", "openai")
    fn name(&self) -> &'static str;

    /// Chat completion: system prompt + user prompt, returns the reply text.
    /// Implementations request JSON-formatted output where the API supports it.
    async fn chat(&self, system: &str, user: &str) -> Result<String>;

    /// Generate embedding for text
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;

    /// Test connection/availability
    async fn test_connection(&self) -> Result<bool>;
}

/// Attempts per request, with exponential backoff between them
pub(crate) const MAX_ATTEMPTS: u32 = 3;

fn backoff_delay(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_secs(2u64.pow(attempt - 1))
}

/// Run `op` up to [`MAX_ATTEMPTS`] times; `what` names the call in warnings.
pub(crate) async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=MAX_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < MAX_ATTEMPTS {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        what, attempt, MAX_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| CntubeError::analysis(format!("{} failed after retries", what))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_with_retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = with_retry("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32> = with_retry("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CntubeError::analysis("boom")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_with_retry_recovers_after_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<&str> = with_retry("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(CntubeError::analysis("transient"))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
