use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level relay configuration, loaded from crosstalk.toml.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub bot: BotSection,
    pub messages: MessagesSection,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address the game-server relay socket listens on.
    pub relay_address: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            relay_address: "0.0.0.0:27115".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite:crosstalk.db?mode=rwc".into(),
        }
    }
}

/// How channel-bound messages are posted to Discord.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStyle {
    Plain,
    #[default]
    Embed,
    Webhook,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct BotSection {
    pub token: String,
    pub message_style: MessageStyle,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            message_style: MessageStyle::Embed,
        }
    }
}

/// Templates for the plain renderings. Chat takes %username% and %message%;
/// the four situational event templates take %data%; the generic event
/// template takes %event% and %data%.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct MessagesSection {
    pub chat: String,
    pub map_start: String,
    pub map_end: String,
    pub player_connect: String,
    pub player_disconnect: String,
    pub event: String,
}

impl Default for MessagesSection {
    fn default() -> Self {
        Self {
            chat: "**%username%**: %message%".into(),
            map_start: "Map changed to **%data%**".into(),
            map_end: "Round ended on **%data%**".into(),
            player_connect: "**%data%** has connected".into(),
            player_disconnect: "**%data%** has disconnected".into(),
            event: "**%event%**: %data%".into(),
        }
    }
}

impl RelayConfig {
    /// Load config from a TOML file. Falls back to defaults if the file
    /// doesn't exist. Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RELAY_ADDRESS") {
            self.server.relay_address = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("BOT_TOKEN") {
            self.bot.token = v;
        }
        if let Ok(v) = std::env::var("MESSAGE_STYLE") {
            match v.to_lowercase().as_str() {
                "plain" => self.bot.message_style = MessageStyle::Plain,
                "embed" => self.bot.message_style = MessageStyle::Embed,
                "webhook" => self.bot.message_style = MessageStyle::Webhook,
                other => info!("ignoring unknown MESSAGE_STYLE {:?}", other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.server.relay_address, "0.0.0.0:27115");
        assert_eq!(config.bot.message_style, MessageStyle::Embed);
        assert!(config.messages.chat.contains("%username%"));
        assert!(config.messages.chat.contains("%message%"));
        assert!(config.messages.event.contains("%event%"));
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: RelayConfig = toml::from_str(
            r#"
            [server]
            relay_address = "127.0.0.1:9000"

            [bot]
            token = "abc"
            message_style = "webhook"

            [messages]
            chat = "%username% says %message%"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.relay_address, "127.0.0.1:9000");
        assert_eq!(config.bot.token, "abc");
        assert_eq!(config.bot.message_style, MessageStyle::Webhook);
        assert_eq!(config.messages.chat, "%username% says %message%");
        // Unset sections keep their defaults.
        assert!(config.messages.event.contains("%event%"));
        assert_eq!(config.database.url, "sqlite:crosstalk.db?mode=rwc");
    }
}
