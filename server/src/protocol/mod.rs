pub mod chat;
pub mod event;
pub mod identification;

pub use chat::ChatMessage;
pub use event::EventMessage;

use crate::config::MessagesSection;
use crate::discord::types::{Embed, WebhookParams};
use crate::packet::PacketReader;
use identification::ProfileResolver;

/// Frame discriminator — the first byte of every relayed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Chat = 0,
    Event = 1,
}

impl MessageType {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(MessageType::Chat),
            1 => Some(MessageType::Event),
            _ => None,
        }
    }
}

/// Header shared by every message variant: the originating entity's name.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMessage {
    pub entity_name: String,
}

/// One relayed message.
///
/// Wire format: `[type:1][EntityName: cstring]` followed by the variant's
/// fields. Messages are transient — decoded from one inbound frame, rendered
/// and delivered, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Chat(ChatMessage),
    Event(EventMessage),
}

impl Message {
    /// Decode one frame. A truncated or unrecognized frame aborts this frame
    /// only; the connection carries on with the next one.
    pub fn decode(buf: &[u8]) -> Result<Message, DecodeError> {
        let mut r = PacketReader::new(buf);

        let type_byte = r.read_u8().ok_or(DecodeError::MissingField("type"))?;
        let msg_type = MessageType::from_u8(type_byte)
            .ok_or(DecodeError::UnknownType(type_byte))?;

        let entity_name = r
            .try_read_string()
            .ok_or(DecodeError::MissingField("entity name"))?;
        let base = BaseMessage { entity_name };

        match msg_type {
            MessageType::Chat => Ok(Message::Chat(ChatMessage::parse(base, &mut r)?)),
            MessageType::Event => Ok(Message::Event(EventMessage::parse(base, &mut r)?)),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Chat(_) => MessageType::Chat,
            Message::Event(_) => MessageType::Event,
        }
    }

    /// Name of the entity the frame came from.
    pub fn entity_name(&self) -> &str {
        match self {
            Message::Chat(m) => &m.base.entity_name,
            Message::Event(m) => &m.base.entity_name,
        }
    }

    /// Re-encode to the exact bytes `decode` accepts. Decode→marshal on a
    /// well-formed frame reproduces the original bytes.
    pub fn marshal(&self) -> Vec<u8> {
        match self {
            Message::Chat(m) => m.marshal(),
            Message::Event(m) => m.marshal(),
        }
    }

    /// Render as a single line of text using the configured templates.
    pub fn plain(&self, messages: &MessagesSection) -> String {
        match self {
            Message::Chat(m) => m.plain(messages),
            Message::Event(m) => m.plain(messages),
        }
    }

    /// Render as a Discord embed.
    pub fn embed(&self) -> Embed {
        match self {
            Message::Chat(m) => m.embed(),
            Message::Event(m) => m.embed(),
        }
    }

    /// Render as webhook parameters, impersonating the player (chat) or the
    /// relay entity (events). The avatar lookup is best-effort.
    pub async fn webhook(
        &self,
        resolver: &ProfileResolver,
        messages: &MessagesSection,
    ) -> WebhookParams {
        match self {
            Message::Chat(m) => m.webhook(resolver).await,
            Message::Event(m) => m.webhook(messages),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum DecodeError {
    /// Discriminator byte is outside the known message kinds.
    UnknownType(u8),
    /// A field's NUL terminator was missing, or the frame ended early.
    MissingField(&'static str),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnknownType(b) => write!(f, "unrecognized message type {b}"),
            DecodeError::MissingField(name) => write!(f, "missing field: {name}"),
        }
    }
}

impl std::error::Error for DecodeError {}
