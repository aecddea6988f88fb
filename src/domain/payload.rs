//! Message body exchanged with the asynchronous work queue.
//!
//! A body is a JSON array of `{"url": ..., "user_id": ...}` objects. Decoding
//! is strict: anything that is not exactly that shape is rejected rather than
//! partially accepted.

use serde::{Deserialize, Deserializer, Serialize};

/// Errors produced by the payload codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("Failed to encode payloads: {0}")]
    Encode(String),

    #[error("Malformed payload body: {0}")]
    Malformed(String),
}

/// A mention of `url` by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payload {
    url: String,
    #[serde(deserialize_with = "user_id_as_string")]
    user_id: String,
}

impl Payload {
    pub fn new(url: impl Into<String>, user_id: impl ToString) -> Self {
        Self {
            url: url.into(),
            user_id: user_id.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Encodes a batch of payloads into a queue message body.
    pub fn serialize(payloads: &[Payload]) -> Result<String, PayloadError> {
        serde_json::to_string(payloads).map_err(|e| PayloadError::Encode(e.to_string()))
    }

    /// Decodes a queue message body.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] if the body is not a JSON array of
    /// objects with exactly the `url` and `user_id` fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use mention_tracker::domain::payload::Payload;
    ///
    /// let payloads = Payload::deserialize(r#"[{"url":"http://bit.ly/a","user_id":42}]"#).unwrap();
    /// assert_eq!(payloads[0].user_id(), "42");
    /// ```
    pub fn deserialize(body: &str) -> Result<Vec<Payload>, PayloadError> {
        serde_json::from_str(body).map_err(|e| PayloadError::Malformed(e.to_string()))
    }
}

/// Accepts user ids sent either as strings or as integers.
fn user_id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUserId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawUserId::deserialize(deserializer)? {
        RawUserId::Text(s) => s,
        RawUserId::Unsigned(n) => n.to_string(),
        RawUserId::Signed(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let payloads = vec![
            Payload::new("http://bit.ly/abc", "123"),
            Payload::new("http://amzn.to/x|y,z", "ユーザー"),
            Payload::new("http://t.co/\"quoted\"?a=1&b=2", "]}{["),
        ];

        let body = Payload::serialize(&payloads).unwrap();
        assert_eq!(Payload::deserialize(&body).unwrap(), payloads);
    }

    #[test]
    fn test_round_trip_empty() {
        let body = Payload::serialize(&[]).unwrap();
        assert_eq!(body, "[]");
        assert!(Payload::deserialize(&body).unwrap().is_empty());
    }

    #[test]
    fn test_numeric_user_id_coerced() {
        let payloads =
            Payload::deserialize(r#"[{"url":"u","user_id":17},{"url":"v","user_id":-3}]"#).unwrap();
        assert_eq!(payloads[0].user_id(), "17");
        assert_eq!(payloads[1].user_id(), "-3");
    }

    #[test]
    fn test_malformed_input_rejected() {
        let bad = [
            "",
            "not json",
            "{}",
            r#"{"url":"u","user_id":"1"}"#,
            r#"[{"url":"u"}]"#,
            r#"[{"user_id":"1"}]"#,
            r#"[{"url":"u","user_id":"1","extra":true}]"#,
            r#"[{"url":"u","user_id":"1"}, 5]"#,
            r#"[{"url":"u","user_id":null}]"#,
            r#"[{"url":"u","user_id":1.5}]"#,
            "__import__('os').system('true')",
        ];

        for body in bad {
            assert!(
                matches!(Payload::deserialize(body), Err(PayloadError::Malformed(_))),
                "accepted {body:?}"
            );
        }
    }
}
