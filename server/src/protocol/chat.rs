use chrono::Utc;

use crate::config::MessagesSection;
use crate::discord::types::{Embed, EmbedAuthor, EmbedFooter, WebhookParams};
use crate::packet::{PacketBuilder, PacketReader};

use super::identification::{IdentificationType, ProfileResolver};
use super::{BaseMessage, DecodeError, MessageType};

/// A player chat line relayed from a game server.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub base: BaseMessage,
    pub id_type: IdentificationType,
    pub id: String,
    pub username: String,
    pub message: String,
}

impl ChatMessage {
    /// Decode the chat-specific fields following the frame header.
    pub fn parse(base: BaseMessage, r: &mut PacketReader) -> Result<Self, DecodeError> {
        let id_byte = r.read_u8().ok_or(DecodeError::MissingField("id type"))?;
        // Out-of-range provider bytes coerce to Invalid, they never fail
        // the decode.
        let id_type = IdentificationType::from_u8(id_byte);

        let id = r.try_read_string().ok_or(DecodeError::MissingField("id"))?;
        let username = r
            .try_read_string()
            .ok_or(DecodeError::MissingField("username"))?;
        let message = r
            .try_read_string()
            .ok_or(DecodeError::MissingField("message"))?;

        Ok(ChatMessage {
            base,
            id_type,
            id,
            username,
            message,
        })
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut b = PacketBuilder::new();
        b.write_u8(MessageType::Chat as u8);
        b.write_cstring(&self.base.entity_name);
        b.write_u8(self.id_type as u8);
        b.write_cstring(&self.id);
        b.write_cstring(&self.username);
        b.write_cstring(&self.message);
        b.build()
    }

    pub fn plain(&self, messages: &MessagesSection) -> String {
        messages
            .chat
            .replace("%username%", &self.username)
            .replace("%message%", &self.message)
    }

    pub fn embed(&self) -> Embed {
        Embed {
            color: id_color(&self.id),
            description: Some(self.message.clone()),
            timestamp: Some(Utc::now().to_rfc3339()),
            author: Some(EmbedAuthor {
                name: self.username.clone(),
                url: self.id_type.format_url(&self.id),
            }),
            footer: Some(EmbedFooter {
                text: format!("{} | {}", self.base.entity_name, self.id),
            }),
            fields: Vec::new(),
        }
    }

    /// Impersonated post: the player's name and message, with their profile
    /// avatar when the lookup succeeds. Lookup failures drop the avatar and
    /// nothing else.
    pub async fn webhook(&self, resolver: &ProfileResolver) -> WebhookParams {
        WebhookParams {
            username: self.username.clone(),
            avatar_url: resolver.resolve_avatar(self.id_type, &self.id).await,
            content: self.message.clone(),
        }
    }
}

/// Derive the embed color from the identity string: take the trailing
/// 6-byte window (left-padded with zeroes for shorter identities), read its
/// first four bytes as a little-endian u32, divide by 10000.
fn id_color(id: &str) -> u32 {
    let src = id.as_bytes();
    let mut window = [0u8; 6];
    let n = src.len().min(6);
    window[6 - n..].copy_from_slice(&src[src.len() - n..]);
    u32::from_le_bytes([window[0], window[1], window[2], window[3]]) / 10000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChatMessage {
        ChatMessage {
            base: BaseMessage {
                entity_name: "tf2-east".into(),
            },
            id_type: IdentificationType::Steam,
            id: "76561198012345678".into(),
            username: "Alice".into(),
            message: "gg".into(),
        }
    }

    #[test]
    fn test_plain_substitutes_template() {
        let messages = MessagesSection {
            chat: "%username%: %message%".into(),
            ..Default::default()
        };
        assert_eq!(sample().plain(&messages), "Alice: gg");
    }

    #[test]
    fn test_embed_fields() {
        let e = sample().embed();
        assert_eq!(e.description.as_deref(), Some("gg"));
        let author = e.author.unwrap();
        assert_eq!(author.name, "Alice");
        assert_eq!(
            author.url,
            "https://steamcommunity.com/profiles/76561198012345678"
        );
        assert_eq!(
            e.footer.unwrap().text,
            "tf2-east | 76561198012345678"
        );
        assert!(e.fields.is_empty());
    }

    #[test]
    fn test_id_color_trailing_window() {
        // Trailing 6 bytes of "76561198012345678" are "345678"; the color
        // reads the window's first four bytes ("3456") little-endian.
        let expected = u32::from_le_bytes([b'3', b'4', b'5', b'6']) / 10000;
        assert_eq!(id_color("76561198012345678"), expected);
    }

    #[test]
    fn test_id_color_short_identity_is_defined() {
        // Identities shorter than 6 bytes are left-padded with zeroes, so
        // the first four window bytes are zero for 1-2 byte identities.
        assert_eq!(id_color(""), 0);
        assert_eq!(id_color("ab"), 0);
        // 4 bytes: window is [0, 0, 'w', 'x', 'y', 'z'] -> LE of [0,0,w,x]
        let expected = u32::from_le_bytes([0, 0, b'w', b'x']) / 10000;
        assert_eq!(id_color("wxyz"), expected);
    }

    #[test]
    fn test_marshal_field_order() {
        let bytes = sample().marshal();
        assert_eq!(bytes[0], MessageType::Chat as u8);
        assert_eq!(
            bytes,
            b"\x00tf2-east\0\x0176561198012345678\0Alice\0gg\0"
        );
    }
}
