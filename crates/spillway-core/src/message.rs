use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Message attribute that marks a body as a serialized payload pointer. Its
/// value is the byte length of the original body.
pub const RESERVED_ATTRIBUTE_NAME: &str = "ExtendedPayloadSize";

/// Largest message (body plus message attributes) sent through the queue as-is: 256 KiB.
pub const DEFAULT_MESSAGE_SIZE_THRESHOLD: usize = 256 * 1024;

/// Message attribute count accepted by the queue transport. One slot is kept
/// back for [`RESERVED_ATTRIBUTE_NAME`].
pub const TRANSPORT_MAX_MESSAGE_ATTRIBUTES: usize = 10;

/// Typed, caller-supplied message attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dataType", content = "value")]
pub enum MessageAttributeValue {
    String(String),
    Number(String),
    Binary(Vec<u8>),
}

impl MessageAttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        MessageAttributeValue::String(value.into())
    }

    pub fn number(value: impl ToString) -> Self {
        MessageAttributeValue::Number(value.to_string())
    }

    /// Byte length of the value as the transport accounts for it.
    pub fn size(&self) -> usize {
        match self {
            MessageAttributeValue::String(s) | MessageAttributeValue::Number(s) => s.len(),
            MessageAttributeValue::Binary(b) => b.len(),
        }
    }

    /// Textual value for `String` and `Number` attributes.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MessageAttributeValue::String(s) | MessageAttributeValue::Number(s) => Some(s),
            MessageAttributeValue::Binary(_) => None,
        }
    }
}

pub type MessageAttributes = HashMap<String, MessageAttributeValue>;

/// Sum of the UTF-8 byte lengths of every attribute name and value.
pub fn message_attributes_size(attributes: &MessageAttributes) -> usize {
    attributes
        .iter()
        .map(|(name, value)| name.len() + value.size())
        .sum()
}

/// A message as delivered by the queue transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    /// Opaque token identifying this delivery; used to delete the message.
    pub receipt_handle: String,
    pub body: String,
    /// Transport-maintained metadata (sent timestamp, receive count, ...).
    pub attributes: HashMap<String, String>,
    pub message_attributes: MessageAttributes,
}

impl Message {
    /// Value of the reserved marker attribute, if present.
    pub fn payload_marker(&self) -> Option<&MessageAttributeValue> {
        self.message_attributes.get(RESERVED_ATTRIBUTE_NAME)
    }
}
