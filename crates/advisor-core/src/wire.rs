//! JSON shapes exchanged with the worker.
//!
//! Outgoing requests are plain serde structs. Responses are parsed into a
//! `serde_json::Value` first and then interpreted field by field, since the
//! worker may return either a chat completion or an error object and neither
//! is guaranteed to be well formed.

use serde::Serialize;
use serde_json::Value;

use crate::persona::SYSTEM_PROMPT;

pub const UNKNOWN_ERROR_CODE: &str = "unknown_error";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: String,
}

/// Body of the POST sent to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<WireMessage>,
}

impl ChatRequest {
    /// A single stateless turn: the persona followed by the user's text.
    pub fn for_turn(user_text: &str) -> Self {
        Self::with_system_prompt(SYSTEM_PROMPT, user_text)
    }

    pub fn with_system_prompt(system_prompt: &str, user_text: &str) -> Self {
        Self {
            messages: vec![
                WireMessage {
                    role: WireRole::System,
                    content: system_prompt.to_string(),
                },
                WireMessage {
                    role: WireRole::User,
                    content: user_text.to_string(),
                },
            ],
        }
    }
}

/// What a successfully parsed response body asks us to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// The worker forwarded an error object from the model API.
    ServiceError { code: String, message: String },
    /// Trimmed `choices[0].message.content`.
    Reply(String),
    /// `content` is present and truthy but not a string.
    NonTextContent,
    /// Neither an error nor a usable completion.
    Missing,
}

impl Envelope {
    /// Interpret a parsed body. `None` stands for an empty body.
    pub fn interpret(data: Option<&Value>) -> Self {
        let Some(data) = data else {
            return Envelope::Missing;
        };

        if let Some(err) = data.get("error").filter(|v| is_truthy(v)) {
            let code = first_truthy(
                [err.get("code"), err.get("type")],
                UNKNOWN_ERROR_CODE,
            );
            let message = first_truthy([err.get("message")], DEFAULT_ERROR_MESSAGE);
            return Envelope::ServiceError { code, message };
        }

        match reply_content(data) {
            Some(Value::String(content)) => Envelope::Reply(content.trim().to_string()),
            Some(_) => Envelope::NonTextContent,
            None => Envelope::Missing,
        }
    }
}

/// `choices[0].message.content`, only when it is truthy.
fn reply_content(data: &Value) -> Option<&Value> {
    data.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")
        .filter(|v| is_truthy(v))
}

/// JavaScript-style truthiness for JSON values: null, false, 0 and "" are
/// treated as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Display text of a truthy value. Strings are used as-is, anything else in
/// its JSON form.
fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluate the candidates in order and return the first truthy one, or the
/// default when none is.
pub fn first_truthy<'a, I>(candidates: I, default: &str) -> String
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|v| is_truthy(v))
        .map(display_text)
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_has_system_then_user() {
        let request = ChatRequest::for_turn("Which serum for dry skin?");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Which serum for dry skin?");
    }

    #[test]
    fn test_reply_is_trimmed() {
        let data = json!({"choices": [{"message": {"content": "  Use a gentle cleanser.\n"}}]});
        assert_eq!(
            Envelope::interpret(Some(&data)),
            Envelope::Reply("Use a gentle cleanser.".to_string())
        );
    }

    #[test]
    fn test_error_prefers_code_then_type() {
        let with_code = json!({"error": {"code": "rate_limited", "type": "requests", "message": "Too many requests"}});
        let with_type = json!({"error": {"type": "invalid_request_error", "message": "Bad input"}});
        let bare = json!({"error": {}});

        assert_eq!(
            Envelope::interpret(Some(&with_code)),
            Envelope::ServiceError {
                code: "rate_limited".to_string(),
                message: "Too many requests".to_string(),
            }
        );
        assert_eq!(
            Envelope::interpret(Some(&with_type)),
            Envelope::ServiceError {
                code: "invalid_request_error".to_string(),
                message: "Bad input".to_string(),
            }
        );
        assert_eq!(
            Envelope::interpret(Some(&bare)),
            Envelope::ServiceError {
                code: UNKNOWN_ERROR_CODE.to_string(),
                message: DEFAULT_ERROR_MESSAGE.to_string(),
            }
        );
    }

    #[test]
    fn test_empty_code_falls_through_to_type() {
        let data = json!({"error": {"code": "", "type": "server_error", "message": null}});
        assert_eq!(
            Envelope::interpret(Some(&data)),
            Envelope::ServiceError {
                code: "server_error".to_string(),
                message: DEFAULT_ERROR_MESSAGE.to_string(),
            }
        );
    }

    #[test]
    fn test_numeric_code_is_rendered_as_text() {
        let data = json!({"error": {"code": 429, "message": "Slow down"}});
        assert_eq!(
            Envelope::interpret(Some(&data)),
            Envelope::ServiceError {
                code: "429".to_string(),
                message: "Slow down".to_string(),
            }
        );
    }

    #[test]
    fn test_falsy_error_field_is_ignored() {
        let data = json!({"error": null, "choices": [{"message": {"content": "Hi"}}]});
        assert_eq!(Envelope::interpret(Some(&data)), Envelope::Reply("Hi".to_string()));
    }

    #[test]
    fn test_missing_paths() {
        let cases = [
            json!({}),
            json!({"choices": []}),
            json!({"choices": [{}]}),
            json!({"choices": [{"message": {}}]}),
            json!({"choices": [{"message": {"content": ""}}]}),
            json!({"choices": [{"message": {"content": 0}}]}),
            json!({"choices": [{"message": {"content": false}}]}),
            json!("just a string"),
            json!(null),
        ];
        for data in &cases {
            assert_eq!(Envelope::interpret(Some(data)), Envelope::Missing, "{data}");
        }
        assert_eq!(Envelope::interpret(None), Envelope::Missing);
    }

    #[test]
    fn test_truthy_non_string_content() {
        let cases = [
            json!({"choices": [{"message": {"content": 42}}]}),
            json!({"choices": [{"message": {"content": true}}]}),
            json!({"choices": [{"message": {"content": {}}}]}),
            json!({"choices": [{"message": {"content": []}}]}),
        ];
        for data in &cases {
            assert_eq!(Envelope::interpret(Some(data)), Envelope::NonTextContent, "{data}");
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }
}
