use sqlx::SqlitePool;

use crate::db::entity::{Entity, EntityType, encode_channels, parse_channels};
use crate::db::models::EntityRow;

/// Errors from directory operations, surfaced verbatim to the
/// administrative caller that issued them.
#[derive(Debug)]
pub enum DirectoryError {
    /// No entity with the requested identifier.
    NotFound,
    /// Create was issued for an identifier that already exists.
    Conflict,
    /// A stored row failed to decode (bad type tag or channel list).
    Corrupt(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::NotFound => write!(f, "entity not found"),
            DirectoryError::Conflict => write!(f, "entity already exists"),
            DirectoryError::Corrupt(detail) => write!(f, "corrupt entity record: {detail}"),
            DirectoryError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error()
            && db_err.is_unique_violation()
        {
            return DirectoryError::Conflict;
        }
        DirectoryError::Database(e)
    }
}

fn row_to_entity(row: EntityRow) -> Result<Entity, DirectoryError> {
    let entity_type = EntityType::from_i64(row.entity_type)
        .ok_or_else(|| DirectoryError::Corrupt(format!("type tag {}", row.entity_type)))?;
    let receive_channels = parse_channels(&row.receive_channels)
        .map_err(|e| DirectoryError::Corrupt(e.to_string()))?;
    let send_channels = parse_channels(&row.send_channels)
        .map_err(|e| DirectoryError::Corrupt(e.to_string()))?;

    Ok(Entity {
        id: row.id,
        entity_type,
        receive_channels,
        send_channels,
        created_at: row.created_at,
    })
}

/// Fetch one entity by identifier.
pub async fn fetch_entity(pool: &SqlitePool, id: &str) -> Result<Entity, DirectoryError> {
    let row = sqlx::query_as::<_, EntityRow>("SELECT * FROM relay_entities WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DirectoryError::NotFound)?;

    row_to_entity(row)
}

/// Fetch all entities of the given type. `EntityType::All` is the
/// directory-wide wildcard and returns every stored entity.
pub async fn fetch_entities(
    pool: &SqlitePool,
    entity_type: EntityType,
) -> Result<Vec<Entity>, DirectoryError> {
    let rows = match entity_type {
        EntityType::All => {
            sqlx::query_as::<_, EntityRow>("SELECT * FROM relay_entities ORDER BY id")
                .fetch_all(pool)
                .await?
        }
        _ => {
            sqlx::query_as::<_, EntityRow>(
                "SELECT * FROM relay_entities WHERE type = ? ORDER BY id",
            )
            .bind(entity_type as i64)
            .fetch_all(pool)
            .await?
        }
    };

    rows.into_iter().map(row_to_entity).collect()
}

/// Insert a new entity. Fails with `Conflict` when the identifier is taken.
/// The wildcard type is a query concept only and is rejected here.
pub async fn create_entity(pool: &SqlitePool, entity: &Entity) -> Result<(), DirectoryError> {
    if entity.entity_type == EntityType::All {
        return Err(DirectoryError::Corrupt(
            "wildcard type cannot be stored".to_string(),
        ));
    }

    sqlx::query(
        "INSERT INTO relay_entities (id, type, receive_channels, send_channels) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(&entity.id)
    .bind(entity.entity_type as i64)
    .bind(encode_channels(&entity.receive_channels))
    .bind(encode_channels(&entity.send_channels))
    .execute(pool)
    .await?;

    Ok(())
}

/// Atomically replace both channel sets of an existing entity.
pub async fn update_channels(
    pool: &SqlitePool,
    id: &str,
    receive_channels: &[i64],
    send_channels: &[i64],
) -> Result<(), DirectoryError> {
    let result = sqlx::query(
        "UPDATE relay_entities SET receive_channels = ?, send_channels = ? WHERE id = ?",
    )
    .bind(encode_channels(receive_channels))
    .bind(encode_channels(send_channels))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DirectoryError::NotFound);
    }
    Ok(())
}
