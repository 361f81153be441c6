pub mod json_file;
pub mod postgres;
pub mod turn_log;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::MemoryBackend;
use crate::models::ConversationTurn;

/// Durable per-user conversation memory. Storage is unbounded; reads are
/// windowed. All backends share the same semantics: `recent` returns up to
/// `limit` turns ordered oldest-to-newest, and an unknown user yields an
/// empty list, never an error.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append(&self, user_id: &str, pregunta: &str, respuesta: &str) -> Result<()>;

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;

    /// Most recent turns across all users, newest first. Backs the debug view.
    async fn latest(&self, limit: i64) -> Result<Vec<ConversationTurn>>;
}

pub async fn open(backend: &MemoryBackend) -> Result<Arc<dyn ConversationStore>> {
    match backend {
        MemoryBackend::TurnLog { dir } => Ok(Arc::new(turn_log::TurnLogStore::new(
            std::path::Path::new(dir),
        )?)),
        MemoryBackend::JsonFile { path } => Ok(Arc::new(json_file::JsonFileStore::open(
            std::path::Path::new(path),
        )?)),
        MemoryBackend::Postgres { database_url } => {
            let store = postgres::PostgresStore::connect(database_url).await?;
            store.init_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
