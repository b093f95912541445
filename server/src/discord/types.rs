use serde::Serialize;

/// A Discord message embed, in the API's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// Parameters for an impersonated webhook post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookParams {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_serializes_without_empty_parts() {
        let embed = Embed {
            color: 16777215,
            description: None,
            timestamp: None,
            author: None,
            footer: Some(EmbedFooter {
                text: "tf2-east".into(),
            }),
            fields: Vec::new(),
        };
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["color"], 16777215);
        assert_eq!(json["footer"]["text"], "tf2-east");
        assert!(json.get("description").is_none());
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn test_author_url_skipped_when_empty() {
        let author = EmbedAuthor {
            name: "Alice".into(),
            url: String::new(),
        };
        let json = serde_json::to_value(&author).unwrap();
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_webhook_params_shape() {
        let params = WebhookParams {
            username: "Alice".into(),
            avatar_url: Some("https://cdn.example/a.jpg".into()),
            content: "gg".into(),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["username"], "Alice");
        assert_eq!(json["avatar_url"], "https://cdn.example/a.jpg");
        assert_eq!(json["content"], "gg");
    }
}
