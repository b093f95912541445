use serde::{Deserialize, Serialize};

/// A stored relay entity as it sits in the database. Channel sets stay in
/// their comma-joined storage encoding until decoded into an `Entity`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EntityRow {
    pub id: String,
    #[sqlx(rename = "type")]
    pub entity_type: i64,
    pub receive_channels: String,
    pub send_channels: String,
    pub created_at: String,
}
