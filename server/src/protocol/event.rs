use chrono::Utc;

use crate::config::MessagesSection;
use crate::discord::types::{Embed, EmbedField, EmbedFooter, WebhookParams};
use crate::packet::{PacketBuilder, PacketReader};

use super::{BaseMessage, DecodeError, MessageType};

/// Embed color for event cards (white).
const EVENT_EMBED_COLOR: u32 = 16_777_215;

/// Mass-mention control tokens stripped from outbound event text.
const MENTION_TOKENS: [&str; 2] = ["@everyone", "@here"];

/// A game event (map change, player connect, ...) relayed from a game server.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub base: BaseMessage,
    pub event: String,
    pub data: String,
}

impl EventMessage {
    /// Decode the event-specific fields following the frame header.
    pub fn parse(base: BaseMessage, r: &mut PacketReader) -> Result<Self, DecodeError> {
        let event = r
            .try_read_string()
            .ok_or(DecodeError::MissingField("event"))?;
        let data = r
            .try_read_string()
            .ok_or(DecodeError::MissingField("data"))?;

        Ok(EventMessage { base, event, data })
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut b = PacketBuilder::new();
        b.write_u8(MessageType::Event as u8);
        b.write_cstring(&self.base.entity_name);
        b.write_cstring(&self.event);
        b.write_cstring(&self.data);
        b.build()
    }

    /// Pick the template by exact event name; unknown events fall back to
    /// the generic template, which also substitutes the event name.
    pub fn plain(&self, messages: &MessagesSection) -> String {
        match self.event.as_str() {
            "Map Start" => messages.map_start.replace("%data%", &self.data),
            "Map Ended" => messages.map_end.replace("%data%", &self.data),
            "Player Connected" => messages.player_connect.replace("%data%", &self.data),
            "Player Disconnected" => {
                messages.player_disconnect.replace("%data%", &self.data)
            }
            _ => messages
                .event
                .replace("%data%", &self.data)
                .replace("%event%", &self.event),
        }
    }

    pub fn embed(&self) -> Embed {
        Embed {
            color: EVENT_EMBED_COLOR,
            description: None,
            timestamp: Some(Utc::now().to_rfc3339()),
            author: None,
            footer: Some(EmbedFooter {
                text: self.base.entity_name.clone(),
            }),
            fields: vec![EmbedField {
                name: scrub_mentions(&self.event),
                value: scrub_mentions(&self.data),
            }],
        }
    }

    /// Impersonated post under the relay entity's name, carrying the
    /// scrubbed plain rendering.
    pub fn webhook(&self, messages: &MessagesSection) -> WebhookParams {
        WebhookParams {
            username: self.base.entity_name.clone(),
            avatar_url: None,
            content: scrub_mentions(&self.plain(messages)),
        }
    }
}

/// Remove every mass-mention token, repeating until none remains, so that
/// adversarial concatenations like `@ev@hereeryone` cannot survive a pass.
pub fn scrub_mentions(s: &str) -> String {
    let mut out = s.to_string();
    loop {
        let next = out.replace(MENTION_TOKENS[0], "").replace(MENTION_TOKENS[1], "");
        if next == out {
            return out;
        }
        out = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(event: &str, data: &str) -> EventMessage {
        EventMessage {
            base: BaseMessage {
                entity_name: "tf2-east".into(),
            },
            event: event.into(),
            data: data.into(),
        }
    }

    #[test]
    fn test_plain_map_start_uses_situational_template() {
        let rendered = sample("Map Start", "de_dust2").plain(&MessagesSection::default());
        assert!(rendered.contains("de_dust2"));
        // Must not fall through to the generic template.
        assert!(!rendered.contains("Map Start"));
    }

    #[test]
    fn test_plain_unknown_event_uses_generic_template() {
        let rendered = sample("Custom", "hi").plain(&MessagesSection::default());
        assert!(rendered.contains("Custom"));
        assert!(rendered.contains("hi"));
    }

    #[test]
    fn test_plain_all_situational_templates() {
        let messages = MessagesSection::default();
        for event in [
            "Map Start",
            "Map Ended",
            "Player Connected",
            "Player Disconnected",
        ] {
            let rendered = sample(event, "payload").plain(&messages);
            assert!(rendered.contains("payload"), "template for {event}");
        }
    }

    #[test]
    fn test_scrub_removes_tokens() {
        assert_eq!(scrub_mentions("hi @everyone and @here"), "hi  and ");
        assert_eq!(scrub_mentions("clean"), "clean");
        assert_eq!(scrub_mentions(""), "");
    }

    #[test]
    fn test_scrub_is_fixed_point() {
        // Removing "@here" from "@ev@hereeryone" yields "@everyone", which a
        // single pass would leave behind.
        assert_eq!(scrub_mentions("@ev@hereeryone"), "");
        assert_eq!(scrub_mentions("@@everyoneeveryone"), "");
        let scrubbed = scrub_mentions("@ev@hereeryone says @h@everyoneere");
        assert!(!scrubbed.contains("@everyone"));
        assert!(!scrubbed.contains("@here"));
    }

    #[test]
    fn test_embed_scrubs_both_fields() {
        let e = sample("join @everyone", "@here now").embed();
        assert_eq!(e.color, EVENT_EMBED_COLOR);
        assert_eq!(e.footer.unwrap().text, "tf2-east");
        let field = &e.fields[0];
        assert!(!field.name.contains("@everyone"));
        assert!(!field.value.contains("@here"));
    }

    #[test]
    fn test_webhook_impersonates_entity() {
        let w = sample("Custom", "@everyone hi").webhook(&MessagesSection::default());
        assert_eq!(w.username, "tf2-east");
        assert!(w.avatar_url.is_none());
        assert!(!w.content.contains("@everyone"));
    }

    #[test]
    fn test_marshal_field_order() {
        let bytes = sample("Map Start", "de_dust2").marshal();
        assert_eq!(bytes, b"\x01tf2-east\0Map Start\0de_dust2\0");
    }
}
