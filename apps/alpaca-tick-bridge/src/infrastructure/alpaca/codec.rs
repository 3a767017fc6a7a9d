//! Stream Codec Module
//!
//! JSON decoding and encoding for Alpaca's stock data stream. The server
//! batches messages into JSON arrays; each element carries a `T` type tag.
//! Elements with a type the bridge does not consume (bars, statuses, LULD,
//! ...) are skipped.

use serde_json::Value;

use crate::infrastructure::alpaca::messages::{
    AlpacaMessage, ErrorMessage, StockQuoteMessage, StockTradeMessage, SubscriptionMessage,
    SuccessMessage,
};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid message format.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

/// JSON codec for the stock stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into messages.
    ///
    /// Accepts both the usual array form and a bare object.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON parsing fails or a known message type has
    /// an invalid shape.
    pub fn decode(self, text: &str) -> Result<Vec<AlpacaMessage>, CodecError> {
        let trimmed = text.trim();

        let values = match serde_json::from_str::<Value>(trimmed)? {
            Value::Array(values) => values,
            value @ Value::Object(_) => vec![value],
            _ => {
                return Err(CodecError::InvalidFormat(format!(
                    "expected JSON array or object, got: {}",
                    trimmed.chars().take(50).collect::<String>()
                )));
            }
        };

        let mut messages = Vec::with_capacity(values.len());
        for value in values {
            if let Some(message) = Self::decode_value(value)? {
                messages.push(message);
            }
        }

        Ok(messages)
    }

    fn decode_value(value: Value) -> Result<Option<AlpacaMessage>, CodecError> {
        let msg_type = value.get("T").and_then(Value::as_str).map(str::to_owned);

        let message = match msg_type.as_deref() {
            Some("success") => AlpacaMessage::Success(serde_json::from_value::<SuccessMessage>(value)?),
            Some("error") => AlpacaMessage::Error(serde_json::from_value::<ErrorMessage>(value)?),
            Some("subscription") => {
                AlpacaMessage::Subscription(serde_json::from_value::<SubscriptionMessage>(value)?)
            }
            Some("q") => AlpacaMessage::Quote(serde_json::from_value::<StockQuoteMessage>(value)?),
            Some("t") => AlpacaMessage::Trade(serde_json::from_value::<StockTradeMessage>(value)?),
            Some(other) => {
                tracing::trace!(message_type = other, "Skipping unhandled message type");
                return Ok(None);
            }
            None => {
                return Err(CodecError::InvalidFormat(
                    "message without a \"T\" type tag".to_string(),
                ));
            }
        };

        Ok(Some(message))
    }

    /// Encode a value to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: serde::Serialize>(self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::alpaca::messages::{SubscriptionRequest, SuccessKind};

    #[test]
    fn decode_connected_array() {
        let msgs = JsonCodec::new()
            .decode(r#"[{"T":"success","msg":"connected"}]"#)
            .unwrap();

        assert_eq!(msgs.len(), 1);
        assert!(matches!(
            &msgs[0],
            AlpacaMessage::Success(m) if m.msg == SuccessKind::Connected
        ));
    }

    #[test]
    fn decode_single_object() {
        let msgs = JsonCodec::new()
            .decode(r#"{"T":"error","code":402,"msg":"auth failed"}"#)
            .unwrap();

        assert!(matches!(&msgs[0], AlpacaMessage::Error(e) if e.code == 402));
    }

    #[test]
    fn decode_mixed_batch_skips_unhandled() {
        let text = r#"[
            {"T":"q","S":"AAPL","bx":"V","bp":185.1,"bs":2,"ax":"V","ap":185.2,"as":3,"t":"2024-01-02T14:30:00Z","c":["R"],"z":"C"},
            {"T":"b","S":"AAPL","o":1,"h":1,"l":1,"c":1,"v":1,"t":"2024-01-02T14:30:00Z"},
            {"T":"t","i":1,"S":"AAPL","x":"D","p":185.15,"s":100,"t":"2024-01-02T14:30:00.5Z","c":["@"],"z":"C"}
        ]"#;

        let msgs = JsonCodec::new().decode(text).unwrap();

        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].label(), "quote");
        assert_eq!(msgs[1].label(), "trade");
    }

    #[test]
    fn decode_subscription_confirmation() {
        let msgs = JsonCodec::new()
            .decode(r#"[{"T":"subscription","trades":["AAPL"],"quotes":["AAPL"],"bars":[]}]"#)
            .unwrap();

        let AlpacaMessage::Subscription(sub) = &msgs[0] else {
            panic!("expected subscription message");
        };
        assert_eq!(sub.quotes, vec!["AAPL"]);
        assert_eq!(sub.trades, vec!["AAPL"]);
    }

    #[test]
    fn decode_empty_array() {
        assert!(JsonCodec::new().decode("[]").unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_scalar() {
        let err = JsonCodec::new().decode("42").unwrap_err();
        assert!(matches!(err, CodecError::InvalidFormat(_)));
    }

    #[test]
    fn decode_rejects_malformed_quote() {
        let err = JsonCodec::new().decode(r#"[{"T":"q","S":"AAPL"}]"#).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn encode_subscription_request() {
        let req = SubscriptionRequest::unsubscribe().with_trades(vec!["MSFT".to_string()]);
        let json = JsonCodec::new().encode(&req).unwrap();
        assert_eq!(json, r#"{"action":"unsubscribe","trades":["MSFT"]}"#);
    }
}
