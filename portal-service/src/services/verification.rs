//! Phone verification over the key-value store.
//!
//! Codes are single use and short lived; a per-phone request counter
//! with a sliding lockout window caps both code sends and failed
//! verify attempts. Exceeding the ceiling blocks the phone for the
//! cool-down and clears in-flight code and counter state.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::services::kv::KeyValueStore;

pub const MAX_ATTEMPTS: i64 = 10;
pub const BLOCK_DURATION_SECONDS: i64 = 3600;
pub const CODE_EXPIRY_SECONDS: i64 = 120;

const CODE_KEY_PREFIX: &str = "sms_code:";
const BLOCKED_KEY_PREFIX: &str = "blocked:";
const REQUEST_COUNTER_PREFIX: &str = "request_counter:";

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Phone number is blocked. Try again in an hour")]
    Blocked,

    #[error("Too many attempts. Try again in an hour")]
    TooManyAttempts,

    #[error("Code not found")]
    CodeNotFound,

    #[error("Invalid code")]
    InvalidCode,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CodeRecord {
    code: String,
    attempts: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Outbound SMS dispatch seam.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> Result<(), anyhow::Error>;
}

/// HTTP SMS gateway client.
pub struct HttpSmsSender {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl HttpSmsSender {
    pub fn new(config: &crate::config::SmsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<(), anyhow::Error> {
        let url = format!("{}/message/sms/send", self.api_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "mobile_phone": phone,
                "message": message,
            }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("SMS gateway request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "SMS gateway returned status {}",
                response.status()
            ));
        }

        Ok(())
    }
}

/// Recording double for tests.
#[derive(Default)]
pub struct MockSmsSender {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
}

impl MockSmsSender {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SmsSender for MockSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<(), anyhow::Error> {
        self.sent
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock sender mutex poisoned: {}", e))?
            .push((phone.to_string(), message.to_string()));
        Ok(())
    }
}

/// Verification-code state machine over the key-value store.
#[derive(Clone)]
pub struct SmsVerifier {
    kv: Arc<dyn KeyValueStore>,
    /// Dev environments pin the code so flows are testable offline.
    fixed_code: Option<String>,
}

impl SmsVerifier {
    pub fn new(kv: Arc<dyn KeyValueStore>, fixed_code: Option<String>) -> Self {
        Self { kv, fixed_code }
    }

    /// Generate and store a fresh code for the phone, overwriting any
    /// prior one. Returns the code for dispatch.
    pub async fn issue_code(&self, phone: &str) -> Result<String, VerificationError> {
        if self.is_blocked(phone).await? {
            return Err(VerificationError::Blocked);
        }

        let counter_key = format!("{}{}", REQUEST_COUNTER_PREFIX, phone);
        let counter = self.kv.incr(&counter_key).await?;
        if counter == 1 {
            self.kv.expire(&counter_key, BLOCK_DURATION_SECONDS).await?;
        }

        if counter > MAX_ATTEMPTS {
            tracing::warn!(phone = %phone, attempts = counter, "Send ceiling reached, blocking phone");
            self.block_phone(phone).await?;
            return Err(VerificationError::TooManyAttempts);
        }

        let code = match &self.fixed_code {
            Some(code) => code.clone(),
            None => format!("{:05}", rand::thread_rng().gen_range(0..100_000)),
        };

        let record = CodeRecord {
            code: code.clone(),
            attempts: 0,
            created_at: chrono::Utc::now(),
        };
        self.store_record(phone, &record).await?;

        tracing::info!(phone = %phone, attempt = counter, "Verification code issued");
        Ok(code)
    }

    /// Check a submitted code. Successful verification consumes the
    /// code; a mismatch only spends the increment already applied.
    pub async fn verify_code(&self, phone: &str, code: &str) -> Result<(), VerificationError> {
        if self.is_blocked(phone).await? {
            return Err(VerificationError::Blocked);
        }

        let code_key = format!("{}{}", CODE_KEY_PREFIX, phone);
        let raw = self
            .kv
            .get(&code_key)
            .await?
            .ok_or(VerificationError::CodeNotFound)?;

        let mut record: CodeRecord = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Corrupt verification record: {}", e))?;

        record.attempts += 1;

        if record.attempts >= MAX_ATTEMPTS {
            tracing::warn!(phone = %phone, "Verify ceiling reached, blocking phone");
            self.block_phone(phone).await?;
            self.kv.delete(&code_key).await?;
            return Err(VerificationError::TooManyAttempts);
        }

        self.store_record(phone, &record).await?;

        if record.code != code {
            return Err(VerificationError::InvalidCode);
        }

        // Single use
        self.kv.delete(&code_key).await?;
        Ok(())
    }

    async fn is_blocked(&self, phone: &str) -> Result<bool, anyhow::Error> {
        let blocked = self
            .kv
            .get(&format!("{}{}", BLOCKED_KEY_PREFIX, phone))
            .await?;
        Ok(blocked.is_some())
    }

    async fn block_phone(&self, phone: &str) -> Result<(), anyhow::Error> {
        self.kv
            .set_ex(
                &format!("{}{}", BLOCKED_KEY_PREFIX, phone),
                "1",
                BLOCK_DURATION_SECONDS,
            )
            .await?;
        // Clear in-flight state so the lockout starts clean
        self.kv
            .delete(&format!("{}{}", REQUEST_COUNTER_PREFIX, phone))
            .await?;
        self.kv
            .delete(&format!("{}{}", CODE_KEY_PREFIX, phone))
            .await?;
        Ok(())
    }

    async fn store_record(&self, phone: &str, record: &CodeRecord) -> Result<(), anyhow::Error> {
        let raw = serde_json::to_string(record)
            .map_err(|e| anyhow::anyhow!("Failed to serialize verification record: {}", e))?;
        self.kv
            .set_ex(
                &format!("{}{}", CODE_KEY_PREFIX, phone),
                &raw,
                CODE_EXPIRY_SECONDS,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::kv::MemoryKv;

    const PHONE: &str = "998991234567";

    fn verifier() -> SmsVerifier {
        SmsVerifier::new(Arc::new(MemoryKv::new()), Some("12345".to_string()))
    }

    #[tokio::test]
    async fn test_issue_and_verify_round_trip() {
        let v = verifier();
        let code = v.issue_code(PHONE).await.expect("issue");
        assert_eq!(code, "12345");
        assert!(v.verify_code(PHONE, &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let v = verifier();
        let code = v.issue_code(PHONE).await.expect("issue");
        v.verify_code(PHONE, &code).await.expect("first use");

        let second = v.verify_code(PHONE, &code).await;
        assert!(matches!(second, Err(VerificationError::CodeNotFound)));
    }

    #[tokio::test]
    async fn test_invalid_code_reported_without_consuming() {
        let v = verifier();
        v.issue_code(PHONE).await.expect("issue");

        let result = v.verify_code(PHONE, "99999").await;
        assert!(matches!(result, Err(VerificationError::InvalidCode)));

        // The stored code survives a mismatch
        assert!(v.verify_code(PHONE, "12345").await.is_ok());
    }

    #[tokio::test]
    async fn test_send_ceiling_blocks_phone() {
        let v = verifier();
        for _ in 0..MAX_ATTEMPTS {
            v.issue_code(PHONE).await.expect("issue within ceiling");
        }

        let over = v.issue_code(PHONE).await;
        assert!(matches!(over, Err(VerificationError::TooManyAttempts)));

        // Blocked for sends and verifies alike, regardless of code correctness
        let send = v.issue_code(PHONE).await;
        assert!(matches!(send, Err(VerificationError::Blocked)));
        let verify = v.verify_code(PHONE, "12345").await;
        assert!(matches!(verify, Err(VerificationError::Blocked)));
    }

    #[tokio::test]
    async fn test_verify_ceiling_blocks_phone() {
        let v = verifier();
        v.issue_code(PHONE).await.expect("issue");

        let mut last = None;
        for _ in 0..MAX_ATTEMPTS {
            last = Some(v.verify_code(PHONE, "00000").await);
        }

        assert!(matches!(
            last,
            Some(Err(VerificationError::TooManyAttempts)) | Some(Err(VerificationError::Blocked))
        ));

        // Correct code no longer helps once blocked
        let result = v.verify_code(PHONE, "12345").await;
        assert!(matches!(result, Err(VerificationError::Blocked)));
    }

    #[tokio::test]
    async fn test_new_code_overwrites_prior_one() {
        let kv = Arc::new(MemoryKv::new());
        let v = SmsVerifier::new(kv, None);

        let first = v.issue_code(PHONE).await.expect("issue");
        let second = v.issue_code(PHONE).await.expect("issue");

        if first != second {
            assert!(matches!(
                v.verify_code(PHONE, &first).await,
                Err(VerificationError::InvalidCode)
            ));
        }
        assert!(v.verify_code(PHONE, &second).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_sender_records_messages() {
        let sender = MockSmsSender::new();
        sender.send(PHONE, "Your code is 12345").await.expect("send");
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, PHONE);
    }
}
