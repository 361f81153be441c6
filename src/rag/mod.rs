pub mod embeddings;
pub mod index_builder;
pub mod vector_store;

use anyhow::Result;
use async_trait::async_trait;

use crate::indexer::chunker::chunk_text;
use crate::indexer::extractor::SourceDocument;
use crate::models::RetrievedPassage;
use crate::service::PassageRetriever;

use self::embeddings::EmbeddingGenerator;
use self::vector_store::VectorStore;

pub struct RagEngine {
    embeddings: EmbeddingGenerator,
    vector_store: VectorStore,
}

impl RagEngine {
    pub async fn new(qdrant_url: &str, collection_name: &str) -> Result<Self> {
        let embeddings = EmbeddingGenerator::new()?;
        let vector_store = VectorStore::new(qdrant_url, collection_name).await?;

        Ok(Self {
            embeddings,
            vector_store,
        })
    }

    pub fn vector_store(&self) -> &VectorStore {
        &self.vector_store
    }

    /// Chunks one document, embeds the chunks in batches and upserts them.
    /// Returns the number of chunks written.
    pub async fn index_document(
        &self,
        doc: &SourceDocument,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<usize> {
        if doc.text.trim().is_empty() {
            return Ok(0);
        }

        let chunks = chunk_text(&doc.text, chunk_size, overlap);
        let batch_size = 32;
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings_batch = self.embeddings.generate(texts)?;

            for (chunk, embedding) in batch.iter().zip(embeddings_batch.into_iter()) {
                self.vector_store
                    .add_chunk(
                        &doc.source_label,
                        chunk.chunk_index,
                        &chunk.text,
                        embedding,
                    )
                    .await?;
            }
        }

        Ok(chunks.len())
    }
}

#[async_trait]
impl PassageRetriever for RagEngine {
    async fn retrieve(&self, question: &str, top_k: u64) -> Result<Vec<RetrievedPassage>> {
        let query_embedding = self.embeddings.generate_single(question)?;
        self.vector_store.search(query_embedding, top_k).await
    }
}
