//! Decoding of Telegram update payloads
//!
//! Both transports see the same shape: `{"update_id":.., "message":{..}}` or
//! the same with `edited_message`. Edits are treated like new messages.

use chitieu_core::IncomingMessage;
use serde_json::Value;

/// Update id, used by the poller to advance its cursor.
pub fn update_id(update: &Value) -> Option<i64> {
    update.get("update_id").and_then(|v| v.as_i64())
}

/// Pull the chat id and text out of an update.
///
/// Returns `None` when the update carries neither `message` nor
/// `edited_message` (service updates are acknowledged and ignored). A message
/// without text decodes with an empty string; the chat id may arrive as a
/// JSON number or string.
pub fn decode_update(update: &Value) -> Option<IncomingMessage> {
    let msg = update
        .get("message")
        .or_else(|| update.get("edited_message"))?;

    let chat_id = match msg.get("chat")?.get("id")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };

    let text = msg
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Some(IncomingMessage { chat_id, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_message() {
        let update = json!({
            "update_id": 42,
            "message": { "chat": { "id": 12345 }, "text": "ca phe 35k #drink" }
        });
        let msg = decode_update(&update).unwrap();
        assert_eq!(msg.chat_id, "12345");
        assert_eq!(msg.text, "ca phe 35k #drink");
        assert_eq!(update_id(&update), Some(42));
    }

    #[test]
    fn test_decode_edited_message() {
        let update = json!({
            "update_id": 43,
            "edited_message": { "chat": { "id": "67890" }, "text": "an trua 75k" }
        });
        let msg = decode_update(&update).unwrap();
        assert_eq!(msg.chat_id, "67890");
        assert_eq!(msg.text, "an trua 75k");
    }

    #[test]
    fn test_decode_no_message_is_noop() {
        let update = json!({ "update_id": 44, "channel_post": {} });
        assert!(decode_update(&update).is_none());
    }

    #[test]
    fn test_decode_missing_text() {
        let update = json!({
            "update_id": 45,
            "message": { "chat": { "id": 1 }, "photo": [] }
        });
        let msg = decode_update(&update).unwrap();
        assert_eq!(msg.text, "");
    }
}
