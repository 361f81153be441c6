use anyhow::Result;

use crate::error::SotoError;

fn config_err<T>(msg: &str) -> Result<T> {
    Err(SotoError::Config(msg.to_string()).into())
}

/// Which Conversation Store backend to run. All three satisfy the same
/// ordering and retention contract.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryBackend {
    /// Per-user append-only JSON-lines files under a directory.
    TurnLog { dir: String },
    /// Single JSON array file of role/content messages.
    JsonFile { path: String },
    /// Postgres table `conversaciones`.
    Postgres { database_url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub qdrant_url: String,
    pub collection: String,
    pub data_dir: String,
    pub memory: MemoryBackend,
    /// Shared secret for /verdb. No default: the debug view stays disabled
    /// unless this is configured explicitly.
    pub debug_token: Option<String>,
    pub history_limit: usize,
    pub top_k: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let openai_api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => return config_err("OPENAI_API_KEY no esta configurada como variable de entorno"),
        };

        let memory = match env_or("SOTO_MEMORY_BACKEND", "turnlog").as_str() {
            "turnlog" => MemoryBackend::TurnLog {
                dir: env_or("SOTO_MEMORY_DIR", "./memoria"),
            },
            "jsonfile" => MemoryBackend::JsonFile {
                path: env_or("SOTO_MEMORY_FILE", "./soto_memoria.json"),
            },
            "postgres" => {
                let database_url = match std::env::var("DATABASE_URL") {
                    Ok(url) if !url.is_empty() => url,
                    _ => return config_err("DATABASE_URL es requerida con SOTO_MEMORY_BACKEND=postgres"),
                };
                MemoryBackend::Postgres { database_url }
            }
            other => return config_err(&format!("SOTO_MEMORY_BACKEND desconocido: {}", other)),
        };

        Ok(Self {
            bind_addr: env_or("SOTO_BIND", "0.0.0.0:8080"),
            openai_api_key,
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: env_or("SOTO_MODEL", "gpt-3.5-turbo"),
            qdrant_url: env_or("QDRANT_URL", "http://localhost:6334"),
            collection: env_or("SOTO_COLLECTION", "soto_obra"),
            data_dir: env_or("SOTO_DATA_DIR", "./data"),
            memory,
            debug_token: std::env::var("SOTO_DEBUG_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            history_limit: 5,
            top_k: 3,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
