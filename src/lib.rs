pub mod config;
pub mod error;
pub mod indexer;
pub mod llm;
pub mod memory;
pub mod models;
pub mod prompt;
pub mod rag;
pub mod service;
