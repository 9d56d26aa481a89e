//! Stripe Client
//!
//! One validated client per process, injected into handlers rather than read
//! from a global. Mutating calls carry a fresh idempotency key; idempotent
//! reads go through bounded retry with exponential backoff and jitter.

use std::time::Duration;

use stripe::{Client, RequestStrategy, StripeError};

use crate::config::StripeConfig;
use crate::error::{PaymentError, Result};

/// Retry policy for idempotent read operations
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// First backoff delay
    pub base_delay_ms: u64,

    /// Backoff ceiling
    pub max_delay_ms: u64,

    /// Per-attempt timeout
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 2_000,
            timeout_secs: 15,
        }
    }
}

/// Stripe API client wrapper
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
    retry: RetryConfig,
}

impl StripeClient {
    /// Create a client from validated configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(config.secret_key.clone()),
            config,
            retry: RetryConfig::default(),
        }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(StripeConfig::from_env()?))
    }

    /// Override the retry policy.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The webhook signing secret.
    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    /// The validated configuration.
    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// The underlying client, for single-shot calls.
    pub(crate) fn inner(&self) -> &Client {
        &self.client
    }

    /// A client carrying a fresh idempotency key. Creates go through this so
    /// a network-level replay cannot double-charge.
    pub(crate) fn idempotent(&self, operation: &str) -> Client {
        let key = format!("{operation}_{}", uuid::Uuid::new_v4());
        self.client
            .clone()
            .with_strategy(RequestStrategy::Idempotent(key))
    }

    /// Run an idempotent read with a per-attempt timeout and bounded retry.
    ///
    /// Retries on HTTP 429, HTTP 5xx and timeouts. Verified dispatch and
    /// session creation never come through here.
    pub(crate) async fn with_retry<T, F, Fut>(&self, operation: &str, operation_fn: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, StripeError>>,
    {
        let timeout_duration = Duration::from_secs(self.retry.timeout_secs);
        let mut attempts = 0;

        loop {
            let result = tokio::time::timeout(timeout_duration, operation_fn()).await;

            match result {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    if !is_retryable_error(&e) || attempts >= self.retry.max_retries {
                        return Err(PaymentError::Stripe(e.to_string()));
                    }

                    let delay = calculate_backoff_delay(
                        attempts,
                        self.retry.base_delay_ms,
                        self.retry.max_delay_ms,
                    );
                    tracing::warn!(
                        operation = operation,
                        attempt = attempts + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying Stripe API call after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempts += 1;
                }
                Err(_timeout) => {
                    if attempts >= self.retry.max_retries {
                        return Err(PaymentError::Stripe(format!(
                            "{operation} timed out after {} seconds",
                            self.retry.timeout_secs
                        )));
                    }

                    tracing::warn!(
                        operation = operation,
                        attempt = attempts + 1,
                        timeout_secs = self.retry.timeout_secs,
                        "Stripe API request timed out, retrying"
                    );
                    tokio::time::sleep(calculate_backoff_delay(
                        attempts,
                        self.retry.base_delay_ms,
                        self.retry.max_delay_ms,
                    ))
                    .await;
                    attempts += 1;
                }
            }
        }
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("test_mode", &self.config.is_test_mode())
            .finish_non_exhaustive()
    }
}

/// Check if an error is worth retrying.
fn is_retryable_error(error: &StripeError) -> bool {
    match error {
        StripeError::Stripe(request_error) => {
            let status = request_error.http_status;
            // Rate limited (429) or server errors (5xx)
            status == 429 || (500..600).contains(&status)
        }
        StripeError::Timeout => true,
        _ => false,
    }
}

/// Exponential backoff with 0-25% jitter.
fn calculate_backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2_u64.saturating_pow(attempt));
    let delay_ms = delay_ms.min(max_ms);

    let jitter = if delay_ms > 0 {
        fastrand::u64(0..=delay_ms / 4)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter))
}
