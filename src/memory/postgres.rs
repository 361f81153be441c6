use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::ConversationStore;
use crate::models::ConversationTurn;

/// Relational backend: one row per turn in `conversaciones`.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversaciones (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL,
                pregunta TEXT NOT NULL,
                respuesta TEXT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_conversaciones_user_ts
            ON conversaciones(user_id, timestamp DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ConversationStore for PostgresStore {
    async fn append(&self, user_id: &str, pregunta: &str, respuesta: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO conversaciones (user_id, pregunta, respuesta) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(pregunta)
        .bind(respuesta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let mut turns = sqlx::query_as::<_, ConversationTurn>(
            r#"
            SELECT user_id, pregunta, respuesta, timestamp
            FROM conversaciones
            WHERE user_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        // Query returns newest first; callers want oldest first.
        turns.reverse();
        Ok(turns)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<ConversationTurn>> {
        let turns = sqlx::query_as::<_, ConversationTurn>(
            r#"
            SELECT user_id, pregunta, respuesta, timestamp
            FROM conversaciones
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(turns)
    }
}
