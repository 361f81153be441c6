use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::ConversationStore;
use crate::models::ConversationTurn;

/// Single JSON array of role/content messages, rewritten on every append.
/// This is the `soto_memoria.json` layout; `user_id` and `timestamp` are
/// optional so files written before those fields existed still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMessage {
    role: String,
    content: String,
    #[serde(default = "default_user")]
    user_id: String,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

fn default_user() -> String {
    "default".to_string()
}

pub struct JsonFileStore {
    path: PathBuf,
    messages: Mutex<Vec<StoredMessage>>,
}

impl JsonFileStore {
    /// Loads the message log. A corrupt or unreadable file starts a fresh
    /// memory instead of failing.
    pub fn open(path: &Path) -> Result<Self> {
        let messages = match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<Vec<StoredMessage>>(&data) {
                Ok(msgs) => msgs,
                Err(e) => {
                    tracing::warn!(
                        "archivo de memoria corrupto o vacio ({}), iniciando nueva memoria",
                        e
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Ok(Self {
            path: path.to_path_buf(),
            messages: Mutex::new(messages),
        })
    }

    fn persist(&self, messages: &[StoredMessage]) -> Result<()> {
        let data = serde_json::to_string_pretty(messages)?;
        std::fs::write(&self.path, data)
            .with_context(|| format!("no se pudo escribir {}", self.path.display()))?;
        Ok(())
    }

    /// Pairs user/assistant messages back into turns, oldest first.
    fn turns_for(messages: &[StoredMessage], user_id: Option<&str>) -> Vec<ConversationTurn> {
        let mut turns = Vec::new();
        let mut pending: Option<&StoredMessage> = None;
        for msg in messages {
            if let Some(uid) = user_id {
                if msg.user_id != uid {
                    continue;
                }
            }
            match msg.role.as_str() {
                "user" => pending = Some(msg),
                "assistant" => {
                    if let Some(q) = pending.take() {
                        turns.push(ConversationTurn {
                            user_id: q.user_id.clone(),
                            pregunta: q.content.clone(),
                            respuesta: msg.content.clone(),
                            timestamp: msg.timestamp,
                        });
                    }
                }
                _ => {}
            }
        }
        turns
    }
}

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn append(&self, user_id: &str, pregunta: &str, respuesta: &str) -> Result<()> {
        let now = Utc::now();
        let mut messages = self.messages.lock().await;
        messages.push(StoredMessage {
            role: "user".to_string(),
            content: pregunta.to_string(),
            user_id: user_id.to_string(),
            timestamp: now,
        });
        messages.push(StoredMessage {
            role: "assistant".to_string(),
            content: respuesta.to_string(),
            user_id: user_id.to_string(),
            timestamp: now,
        });
        self.persist(&messages)
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let messages = self.messages.lock().await;
        let mut turns = Self::turns_for(&messages, Some(user_id));
        if turns.len() > limit {
            turns.drain(..turns.len() - limit);
        }
        Ok(turns)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<ConversationTurn>> {
        let messages = self.messages.lock().await;
        let mut turns = Self::turns_for(&messages, None);
        turns.reverse();
        turns.truncate(limit.max(0) as usize);
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_recent_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memoria.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.append("u1", "hola", "que onda").await.unwrap();
        let turns = store.recent("u1", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].pregunta, "hola");
        assert_eq!(turns[0].respuesta, "que onda");
    }

    #[tokio::test]
    async fn survives_process_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memoria.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.append("u1", "p1", "r1").await.unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        let turns = store.recent("u1", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].pregunta, "p1");
    }

    #[tokio::test]
    async fn corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memoria.json");
        std::fs::write(&path, "{{{not json").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.recent("u1", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_role_content_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memoria.json");
        std::fs::write(
            &path,
            r#"[{"role":"user","content":"hola"},{"role":"assistant","content":"que tal"}]"#,
        )
        .unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        let turns = store.recent("default", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].respuesta, "que tal");
    }

    #[tokio::test]
    async fn recent_is_windowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memoria.json");
        let store = JsonFileStore::open(&path).unwrap();
        for i in 0..7 {
            store
                .append("u1", &format!("p{}", i), &format!("r{}", i))
                .await
                .unwrap();
        }
        let turns = store.recent("u1", 5).await.unwrap();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0].pregunta, "p2");
        assert_eq!(turns[4].pregunta, "p6");
    }
}
