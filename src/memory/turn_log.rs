use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::ConversationStore;
use crate::models::ConversationTurn;

/// One append-only JSON-lines file per user under a memory directory.
/// Appends serialize through a single store-wide lock; each append is one
/// small write, so the contention is negligible.
pub struct TurnLogStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

/// user_id becomes a file name, so anything outside [A-Za-z0-9_-] is
/// replaced. Keeps `"../x"` from escaping the memory directory.
fn sanitize_user_id(user_id: &str) -> String {
    let safe: String = user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "_".to_string()
    } else {
        safe
    }
}

impl TurnLogStore {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("no se pudo crear el directorio de memoria {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn user_file(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", sanitize_user_id(user_id)))
    }

    fn read_turns(&self, path: &Path) -> Result<Vec<ConversationTurn>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("no se pudo leer {}", path.display()))?;
        let mut turns = Vec::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ConversationTurn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    tracing::warn!("linea de memoria corrupta en {}: {}", path.display(), e);
                }
            }
        }
        Ok(turns)
    }
}

#[async_trait]
impl ConversationStore for TurnLogStore {
    async fn append(&self, user_id: &str, pregunta: &str, respuesta: &str) -> Result<()> {
        let turn = ConversationTurn {
            user_id: user_id.to_string(),
            pregunta: pregunta.to_string(),
            respuesta: respuesta.to_string(),
            timestamp: Utc::now(),
        };
        let line = serde_json::to_string(&turn)?;
        let path = self.user_file(user_id);

        let _guard = self.write_lock.lock().await;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("no se pudo abrir {}", path.display()))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        let mut turns = self.read_turns(&self.user_file(user_id))?;
        // Distinct user ids can sanitize to the same file name; the stored
        // records keep the real id, so filter before windowing.
        turns.retain(|t| t.user_id == user_id);
        if turns.len() > limit {
            turns.drain(..turns.len() - limit);
        }
        Ok(turns)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<ConversationTurn>> {
        let mut all = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                all.extend(self.read_turns(&path)?);
            }
        }
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, TurnLogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TurnLogStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn unknown_user_yields_empty_history() {
        let (_dir, store) = store();
        let turns = store.recent("nadie", 5).await.unwrap();
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn append_then_recent_returns_the_turn() {
        let (_dir, store) = store();
        store.append("u1", "¿quién eres?", "soy soto").await.unwrap();
        let turns = store.recent("u1", 1).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].pregunta, "¿quién eres?");
        assert_eq!(turns[0].respuesta, "soy soto");
    }

    #[tokio::test]
    async fn recent_is_windowed_and_oldest_first() {
        let (_dir, store) = store();
        for i in 0..8 {
            store
                .append("u1", &format!("p{}", i), &format!("r{}", i))
                .await
                .unwrap();
        }
        let turns = store.recent("u1", 5).await.unwrap();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0].pregunta, "p3");
        assert_eq!(turns[4].pregunta, "p7");
    }

    #[tokio::test]
    async fn users_do_not_see_each_other() {
        let (_dir, store) = store();
        store.append("ana", "hola", "que tal").await.unwrap();
        store.append("beto", "adios", "nos vemos").await.unwrap();
        let turns = store.recent("ana", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_id, "ana");
    }

    #[tokio::test]
    async fn colliding_sanitized_ids_do_not_leak_history() {
        let (_dir, store) = store();
        // Both ids map to the same ana_b.jsonl file.
        assert_eq!(sanitize_user_id("ana.b"), sanitize_user_id("ana_b"));
        store.append("ana.b", "secreto", "entre nos").await.unwrap();
        store.append("ana_b", "hola", "que tal").await.unwrap();

        let turns = store.recent("ana_b", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_id, "ana_b");
        assert_eq!(turns[0].pregunta, "hola");

        let turns = store.recent("ana.b", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].pregunta, "secreto");
    }

    #[tokio::test]
    async fn hostile_user_id_stays_inside_the_memory_dir() {
        let (dir, store) = store();
        store.append("../fuera", "p", "r").await.unwrap();
        // Everything written must live under the memory directory.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with(".jsonl"));
        assert!(!entries[0].contains(".."));
    }

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_user_id("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_user_id(""), "_");
        assert_eq!(sanitize_user_id("u-1_ok"), "u-1_ok");
    }
}
