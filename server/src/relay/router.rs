use sqlx::SqlitePool;

use crate::db::entity::Entity;
use crate::db::queries::entities::{DirectoryError, fetch_entities};

/// Compute the destination set for a message originating at `origin`:
/// every entity of the complementary type whose receive-channel set shares
/// at least one channel number with the origin's send-channel set.
pub async fn route(pool: &SqlitePool, origin: &Entity) -> Result<Vec<Entity>, DirectoryError> {
    let candidates = fetch_entities(pool, origin.entity_type.polarize()).await?;

    Ok(candidates
        .into_iter()
        .filter(|dest| dest.receives_from(&origin.send_channels))
        .collect())
}
