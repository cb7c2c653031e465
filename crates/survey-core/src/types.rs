//! Wire types shared by the gateway and the verification client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::HashMap;

use crate::Result;

/// A survey submission as posted by the browser
///
/// `answers` is kept as the raw JSON text it arrived as; nothing here looks
/// inside it. When a key repeats, the last occurrence wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "HashMap<String, Box<RawValue>>")]
pub struct Submission {
    /// Token produced by the reCAPTCHA widget
    pub captcha_token: String,

    /// Caller-chosen respondent identifier, used as the last key segment
    pub id: String,

    /// Opaque answers payload
    pub answers: Option<Box<RawValue>>,
}

impl Submission {
    /// Decode a submission from request body bytes
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Bytes to persist for this submission's answers
    ///
    /// A missing or `null` answers field is stored as the literal `null`.
    pub fn answers_bytes(&self) -> Vec<u8> {
        match &self.answers {
            Some(raw) => raw.get().as_bytes().to_vec(),
            None => b"null".to_vec(),
        }
    }
}

impl TryFrom<HashMap<String, Box<RawValue>>> for Submission {
    type Error = serde_json::Error;

    fn try_from(
        mut fields: HashMap<String, Box<RawValue>>,
    ) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            captcha_token: string_field(fields.get("captcha_token").map(|raw| &**raw))?,
            id: string_field(fields.get("id").map(|raw| &**raw))?,
            answers: fields.remove("answers"),
        })
    }
}

/// Missing or `null` decode as the empty string
fn string_field(raw: Option<&RawValue>) -> serde_json::Result<String> {
    match raw {
        Some(raw) => {
            let value: Option<String> = serde_json::from_str(raw.get())?;
            Ok(value.unwrap_or_default())
        }
        None => Ok(String::new()),
    }
}

/// Decoded `siteverify` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationResult {
    /// Whether the token was valid for this site
    pub success: bool,

    /// Score for v3 tokens (1.0 is very likely a human)
    pub score: f64,

    /// Action name the token was issued for
    pub action: String,

    /// When the challenge was solved
    pub challenge_ts: Option<DateTime<Utc>>,

    /// Hostname of the site where the challenge was solved
    pub hostname: String,

    /// Error codes reported by the service
    #[serde(rename = "error-codes")]
    pub error_codes: Vec<String>,
}

/// Status tag of a response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Body of every non-preflight response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: ResponseStatus,
    pub message: String,
}

impl ResponseEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_keeps_answers_verbatim() {
        let body = br#"{"captcha_token":"tok","id":"abc","answers":{"q2": [1, 2], "q1":"yes"}}"#;
        let submission = Submission::from_slice(body).unwrap();

        assert_eq!(submission.captcha_token, "tok");
        assert_eq!(submission.id, "abc");
        assert_eq!(submission.answers_bytes(), br#"{"q2": [1, 2], "q1":"yes"}"#.to_vec());
    }

    #[test]
    fn test_submission_missing_fields() {
        let submission = Submission::from_slice(b"{}").unwrap();
        assert!(submission.captcha_token.is_empty());
        assert!(submission.id.is_empty());
        assert_eq!(submission.answers_bytes(), b"null".to_vec());

        let submission =
            Submission::from_slice(br#"{"id":null,"captcha_token":null,"extra":1}"#).unwrap();
        assert!(submission.id.is_empty());
    }

    #[test]
    fn test_submission_repeated_keys_last_wins() {
        let submission =
            Submission::from_slice(br#"{"id":"a","id":"b","answers":1,"answers":[2]}"#).unwrap();
        assert_eq!(submission.id, "b");
        assert_eq!(submission.answers_bytes(), b"[2]".to_vec());
    }

    #[test]
    fn test_submission_rejects_malformed() {
        assert!(Submission::from_slice(b"").is_err());
        assert!(Submission::from_slice(b"{\"id\":").is_err());
        assert!(Submission::from_slice(b"[1,2]").is_err());
        assert!(Submission::from_slice(br#"{"id":5}"#).is_err());
    }

    #[test]
    fn test_verification_result_decoding() {
        let body = r#"{
            "success": true,
            "score": 0.9,
            "action": "submit",
            "challenge_ts": "2020-04-01T12:30:00Z",
            "hostname": "screencovid.com"
        }"#;
        let result: VerificationResult = serde_json::from_str(body).unwrap();
        assert!(result.success);
        assert_eq!(result.action, "submit");
        assert!(result.challenge_ts.is_some());
        assert!(result.error_codes.is_empty());

        let body = r#"{"success": false, "error-codes": ["invalid-input-response"]}"#;
        let result: VerificationResult = serde_json::from_str(body).unwrap();
        assert!(!result.success);
        assert_eq!(result.error_codes, vec!["invalid-input-response"]);
    }

    #[test]
    fn test_envelope_serialization() {
        let json = serde_json::to_string(&ResponseEnvelope::ok("thank you")).unwrap();
        assert_eq!(json, r#"{"status":"ok","message":"thank you"}"#);

        let json = serde_json::to_string(&ResponseEnvelope::error("error parsing input")).unwrap();
        assert_eq!(json, r#"{"status":"error","message":"error parsing input"}"#);
    }
}
