//! Document delivery with retry and jittered exponential backoff

use rand::Rng;
use std::path::Path;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::RequestError;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::errors::DeliveryError;

/// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`
pub fn retry_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let backoff = config
        .base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.max_delay_ms);

    // Up to 25% jitter so that retries from several chats spread out
    let jitter = if backoff >= 4 {
        rand::thread_rng().gen_range(0..=backoff / 4)
    } else {
        0
    };

    Duration::from_millis(backoff.saturating_add(jitter).min(config.max_delay_ms))
}

/// Whether a failed request is worth sending again
pub fn is_retryable(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Network(_) | RequestError::RetryAfter(_) | RequestError::Io(_)
    )
}

/// Send a local file as a document, retrying transient transport failures
pub async fn send_document_with_retry(
    bot: &Bot,
    chat_id: ChatId,
    path: &Path,
    file_name: &str,
    caption: &str,
    config: &RetryConfig,
) -> Result<Message, DeliveryError> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let document = InputFile::file(path.to_path_buf()).file_name(file_name.to_string());
        let result = bot
            .send_document(chat_id, document)
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await;

        match result {
            Ok(message) => {
                debug!(user_id = %chat_id, attempt, file_name, "Document delivered");
                return Ok(message);
            }
            Err(error) if attempt < max_attempts && is_retryable(&error) => {
                let delay = match &error {
                    RequestError::RetryAfter(wait) => wait.duration(),
                    _ => retry_delay(config, attempt),
                };
                warn!(
                    user_id = %chat_id,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Document delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(source) => {
                return Err(DeliveryError::Transport {
                    attempts: attempt,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_grows_and_is_capped() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
        };

        let first = retry_delay(&config, 1);
        assert!(first >= Duration::from_millis(1000));
        assert!(first <= Duration::from_millis(1250));

        let second = retry_delay(&config, 2);
        assert!(second >= Duration::from_millis(2000));

        for attempt in 3..40 {
            assert!(retry_delay(&config, attempt) <= Duration::from_millis(5000));
        }
    }

    #[test]
    fn test_zero_delay_config() {
        let config = RetryConfig {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 0,
        };
        assert_eq!(retry_delay(&config, 1), Duration::ZERO);
    }

    #[test]
    fn test_api_errors_are_not_retried() {
        let error = RequestError::Api(teloxide::ApiError::BotBlocked);
        assert!(!is_retryable(&error));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(is_retryable(&RequestError::Io(std::sync::Arc::new(io))));
    }
}
