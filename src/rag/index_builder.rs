use std::path::Path;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::indexer::extractor::extract_documents;
use crate::indexer::walker::walk_directory;

use super::RagEngine;

pub const CHUNK_SIZE: usize = 512;
pub const CHUNK_OVERLAP: usize = 64;

#[derive(Debug, Default)]
pub struct IndexStats {
    pub files: usize,
    pub documents: usize,
    pub chunks: usize,
    pub failed_files: Vec<String>,
}

/// Short hash of a source path, for log lines.
pub fn file_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Startup index build. If the collection already holds points the build is
/// skipped entirely; there is no staleness detection, a changed document
/// directory needs an explicit rebuild with `soto-indexer --rebuild`.
pub async fn ensure_index(engine: &RagEngine, data_dir: &Path) -> Result<Option<IndexStats>> {
    let existing = engine.vector_store().count().await?;
    if existing > 0 {
        tracing::info!(
            "Indice existente con {} fragmentos, se omite la construccion",
            existing
        );
        return Ok(None);
    }

    tracing::info!("No se encontro indice, construyendo desde {}", data_dir.display());
    let stats = build_index(engine, data_dir).await?;
    Ok(Some(stats))
}

/// Walks the document directory and indexes every supported file. A file
/// that fails to extract is logged and skipped, never fatal.
pub async fn build_index(engine: &RagEngine, data_dir: &Path) -> Result<IndexStats> {
    if !data_dir.exists() {
        anyhow::bail!(
            "el directorio de documentos no existe: {}",
            data_dir.display()
        );
    }

    let files = walk_directory(data_dir);
    tracing::info!("Indexando {} archivos de {}", files.len(), data_dir.display());

    let mut stats = IndexStats::default();

    for (path, format) in &files {
        let docs = match extract_documents(path, *format) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!("No se pudo indexar {} ({}): {}", path.display(), file_id(path), e);
                stats.failed_files.push(
                    path.file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string()),
                );
                continue;
            }
        };

        let mut file_chunks = 0usize;
        for doc in &docs {
            file_chunks += engine.index_document(doc, CHUNK_SIZE, CHUNK_OVERLAP).await?;
        }

        stats.files += 1;
        stats.documents += docs.len();
        stats.chunks += file_chunks;
    }

    tracing::info!(
        "Indexacion completa: {} archivos, {} documentos, {} fragmentos",
        stats.files,
        stats.documents,
        stats.chunks
    );
    Ok(stats)
}
