use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Inference request body as received by the gateway.
///
/// Only the fields that matter for routing are typed; everything else is
/// carried through untouched. Routing fields are parsed leniently: an ill-typed
/// `prompt`, `messages` list, message or content part is dropped instead of
/// rejecting the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub model: String,

    /// Only a string prompt is used for routing
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_messages",
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Vec<ChatMessage>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl RequestBody {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub role: String,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One element of a multi-part message. Only text parts contribute to the prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Unsupported,
}

impl<'de> Deserialize<'de> for ContentPart {
    /// Any JSON value is accepted; only `{"type": "text", "text": <string>}` is a text part
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value.get("type").and_then(Value::as_str);
        let text = value.get("text").and_then(Value::as_str);
        Ok(match (kind, text) {
            (Some("text"), Some(text)) => ContentPart::Text {
                text: text.to_string(),
            },
            _ => ContentPart::Unsupported,
        })
    }
}

/// `Some(T)` when the field's value has the expected shape, `None` otherwise
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Keep the well-formed messages of an array; anything but an array is no list
fn lenient_messages<'de, D>(deserializer: D) -> Result<Option<Vec<ChatMessage>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Prompt input of a request: either plain text or a structured message list
#[derive(Debug, Clone)]
pub enum PromptInput {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl Default for PromptInput {
    fn default() -> Self {
        PromptInput::Text(String::new())
    }
}

/// Per-request routing context: the model identifier and its prompt input
#[derive(Debug, Clone, Default)]
pub struct RoutingRequest {
    pub model: String,
    pub input: PromptInput,
}

impl RoutingRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: PromptInput::Text(prompt.into()),
        }
    }

    pub fn messages(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            input: PromptInput::Messages(messages),
        }
    }

    /// Build the routing context from a request body.
    ///
    /// A message list wins when it yields any text; otherwise the plain
    /// `prompt` field is used (missing prompt is the empty string).
    pub fn from_body(body: &RequestBody) -> Self {
        if let Some(messages) = &body.messages {
            if !flatten_messages(messages).is_empty() {
                return Self::messages(body.model.clone(), messages.clone());
            }
        }
        Self::text(body.model.clone(), body.prompt.clone().unwrap_or_default())
    }

    pub fn prompt(&self) -> String {
        extract_prompt(&self.input)
    }
}

/// Flatten a prompt input into the single string used for prefix matching.
///
/// Message contents (plain strings and text parts, in order) are joined with
/// `\n`. Messages without content and non-text parts are skipped.
pub fn extract_prompt(input: &PromptInput) -> String {
    match input {
        PromptInput::Text(text) => text.clone(),
        PromptInput::Messages(messages) => flatten_messages(messages),
    }
}

fn flatten_messages(messages: &[ChatMessage]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for message in messages {
        match &message.content {
            Some(MessageContent::Text(text)) => parts.push(text),
            Some(MessageContent::Parts(content_parts)) => {
                for part in content_parts {
                    if let ContentPart::Text { text } = part {
                        parts.push(text);
                    }
                }
            }
            None => {}
        }
    }
    parts.join("\n")
}
