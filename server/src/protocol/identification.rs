use std::time::Duration;

use tracing::debug;

/// Where a player identity comes from. The count of variants acts as the
/// wire sentinel: any byte at or beyond it decodes as `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IdentificationType {
    Invalid = 0,
    Steam = 1,
    Discord = 2,
}

const IDENTIFICATION_TYPE_COUNT: u8 = 3;

impl IdentificationType {
    /// Coerce a wire byte to a provider. Out-of-range values normalize to
    /// `Invalid` rather than failing the decode.
    pub fn from_u8(b: u8) -> Self {
        if b >= IDENTIFICATION_TYPE_COUNT {
            return IdentificationType::Invalid;
        }
        match b {
            1 => IdentificationType::Steam,
            2 => IdentificationType::Discord,
            _ => IdentificationType::Invalid,
        }
    }

    /// Canonical profile URL for the identity, empty when the provider has
    /// no profile pages.
    pub fn format_url(&self, id: &str) -> String {
        match self {
            IdentificationType::Steam => {
                format!("https://steamcommunity.com/profiles/{id}")
            }
            _ => String::new(),
        }
    }

    /// Machine-readable profile feed used for avatar lookup, empty when the
    /// provider has none.
    pub fn format_feed_url(&self, id: &str) -> String {
        match self {
            IdentificationType::Steam => {
                format!("https://steamcommunity.com/profiles/{id}?xml=1")
            }
            _ => String::new(),
        }
    }
}

/// Best-effort avatar lookups against provider profile feeds.
///
/// Every failure mode (no feed for the provider, network error, non-2xx,
/// field absent) collapses to `None`; rendering never blocks on or fails
/// from a profile fetch.
pub struct ProfileResolver {
    http: reqwest::Client,
}

impl ProfileResolver {
    pub fn new() -> Self {
        ProfileResolver {
            http: reqwest::Client::new(),
        }
    }

    pub async fn resolve_avatar(
        &self,
        id_type: IdentificationType,
        id: &str,
    ) -> Option<String> {
        let url = id_type.format_feed_url(id);
        if url.is_empty() {
            return None;
        }

        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(3))
            .send()
            .await
            .map_err(|e| debug!("profile feed fetch failed: {e}"))
            .ok()?;

        if !resp.status().is_success() {
            debug!("profile feed returned {}", resp.status());
            return None;
        }

        let body = resp.text().await.ok()?;
        extract_avatar(&body)
    }
}

impl Default for ProfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the full-size avatar URL out of a Steam profile XML document.
fn extract_avatar(xml: &str) -> Option<String> {
    const OPEN: &str = "<avatarFull><![CDATA[";
    const CLOSE: &str = "]]></avatarFull>";

    let start = xml.find(OPEN)? + OPEN.len();
    let end = xml[start..].find(CLOSE)?;
    let url = xml[start..start + end].trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8_known_values() {
        assert_eq!(IdentificationType::from_u8(0), IdentificationType::Invalid);
        assert_eq!(IdentificationType::from_u8(1), IdentificationType::Steam);
        assert_eq!(IdentificationType::from_u8(2), IdentificationType::Discord);
    }

    #[test]
    fn test_from_u8_sentinel_coerces_to_invalid() {
        assert_eq!(IdentificationType::from_u8(3), IdentificationType::Invalid);
        assert_eq!(IdentificationType::from_u8(4), IdentificationType::Invalid);
        assert_eq!(
            IdentificationType::from_u8(255),
            IdentificationType::Invalid
        );
    }

    #[test]
    fn test_format_url_steam() {
        assert_eq!(
            IdentificationType::Steam.format_url("765611980"),
            "https://steamcommunity.com/profiles/765611980"
        );
    }

    #[test]
    fn test_format_url_undefined_providers_are_empty() {
        assert_eq!(IdentificationType::Invalid.format_url("x"), "");
        assert_eq!(IdentificationType::Discord.format_url("x"), "");
        assert_eq!(IdentificationType::Invalid.format_feed_url("x"), "");
        assert_eq!(IdentificationType::Discord.format_feed_url("x"), "");
    }

    #[test]
    fn test_format_feed_url_steam() {
        assert_eq!(
            IdentificationType::Steam.format_feed_url("765611980"),
            "https://steamcommunity.com/profiles/765611980?xml=1"
        );
    }

    #[test]
    fn test_extract_avatar() {
        let xml = "<profile><avatarFull><![CDATA[https://cdn.example/a_full.jpg]]></avatarFull></profile>";
        assert_eq!(
            extract_avatar(xml),
            Some("https://cdn.example/a_full.jpg".into())
        );
    }

    #[test]
    fn test_extract_avatar_missing_field() {
        assert_eq!(extract_avatar("<profile></profile>"), None);
        assert_eq!(extract_avatar(""), None);
        // Unclosed CDATA must not be treated as a match.
        assert_eq!(extract_avatar("<avatarFull><![CDATA[https://x"), None);
    }

    #[test]
    fn test_extract_avatar_empty_value() {
        let xml = "<avatarFull><![CDATA[]]></avatarFull>";
        assert_eq!(extract_avatar(xml), None);
    }

    #[tokio::test]
    async fn test_resolve_avatar_no_feed_provider() {
        let resolver = ProfileResolver::new();
        // Providers without a feed never touch the network.
        assert_eq!(
            resolver
                .resolve_avatar(IdentificationType::Invalid, "123")
                .await,
            None
        );
    }
}
