use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use sqlx::SqlitePool;

use crate::db::entity::{Entity, EntityType, channel_string, parse_channels};
use crate::db::queries::entities::{create_entity, fetch_entities, update_channels};

/// Administrative operations on the entity directory. Directory errors
/// surface verbatim to the operator.
#[derive(Subcommand)]
pub enum EntityCommand {
    /// Register a new relay entity
    Create {
        /// Entity identifier (game-server name or Discord channel id)
        id: String,
        #[arg(long, value_enum)]
        kind: EntityKind,
        /// Channels the entity receives relay on, comma-joined
        #[arg(long, default_value = "")]
        receive: String,
        /// Channels the entity sends relay on, comma-joined
        #[arg(long, default_value = "")]
        send: String,
    },
    /// Replace both channel sets of an existing entity
    Channels {
        id: String,
        #[arg(long, default_value = "")]
        receive: String,
        #[arg(long, default_value = "")]
        send: String,
    },
    /// List entities in the directory
    List {
        /// Restrict to one entity kind
        #[arg(long, value_enum)]
        kind: Option<EntityKind>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EntityKind {
    Server,
    Channel,
}

impl From<EntityKind> for EntityType {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Server => EntityType::Server,
            EntityKind::Channel => EntityType::Channel,
        }
    }
}

pub async fn run(command: EntityCommand, pool: &SqlitePool) -> anyhow::Result<()> {
    match command {
        EntityCommand::Create {
            id,
            kind,
            receive,
            send,
        } => {
            let entity = Entity {
                id: id.clone(),
                entity_type: kind.into(),
                receive_channels: parse_channels(&receive).context("--receive")?,
                send_channels: parse_channels(&send).context("--send")?,
                created_at: String::new(),
            };
            create_entity(pool, &entity).await?;
            println!("created {} entity {}", entity.entity_type, id);
        }
        EntityCommand::Channels { id, receive, send } => {
            let receive = parse_channels(&receive).context("--receive")?;
            let send = parse_channels(&send).context("--send")?;
            update_channels(pool, &id, &receive, &send).await?;
            println!(
                "updated {id}: receive {} / send {}",
                channel_string(&receive),
                channel_string(&send)
            );
        }
        EntityCommand::List { kind } => {
            let entity_type = kind.map(EntityType::from).unwrap_or(EntityType::All);
            let entities = fetch_entities(pool, entity_type).await?;
            if entities.is_empty() {
                println!("no entities");
            }
            for e in entities {
                println!(
                    "{:<24} {:<8} receive: {:<16} send: {:<16} created: {}",
                    e.id,
                    e.entity_type.to_string(),
                    channel_string(&e.receive_channels),
                    channel_string(&e.send_channels),
                    e.created_at
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, run_migrations};
    use crate::db::queries::entities::fetch_entity;

    async fn setup_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_then_update_via_commands() {
        let pool = setup_db().await;
        run(
            EntityCommand::Create {
                id: "tf2-east".into(),
                kind: EntityKind::Server,
                receive: "1".into(),
                send: "5, 7".into(),
            },
            &pool,
        )
        .await
        .unwrap();

        let e = fetch_entity(&pool, "tf2-east").await.unwrap();
        assert_eq!(e.send_channels, vec![5, 7]);

        run(
            EntityCommand::Channels {
                id: "tf2-east".into(),
                receive: "".into(),
                send: "9".into(),
            },
            &pool,
        )
        .await
        .unwrap();

        let e = fetch_entity(&pool, "tf2-east").await.unwrap();
        assert!(e.receive_channels.is_empty());
        assert_eq!(e.send_channels, vec![9]);
    }

    #[tokio::test]
    async fn test_create_bad_channel_list_fails() {
        let pool = setup_db().await;
        let result = run(
            EntityCommand::Create {
                id: "x".into(),
                kind: EntityKind::Server,
                receive: "1,two".into(),
                send: "".into(),
            },
            &pool,
        )
        .await;
        assert!(result.is_err());
    }
}
