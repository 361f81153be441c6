use anyhow::Result;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map as JsonMap, Value as JsonValue};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::RetrievedPassage;

use super::embeddings::EMBEDDING_DIM;

pub struct VectorStore {
    client: Qdrant,
    collection_name: String,
}

/// Deterministic point id for a chunk, so re-indexing the same document
/// overwrites its old points instead of accumulating duplicates.
fn chunk_point_id(source_label: &str, chunk_index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_label.as_bytes());
    hasher.update(chunk_index.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

impl VectorStore {
    pub async fn new(url: &str, collection_name: &str) -> Result<Self> {
        tracing::info!("Building Qdrant client for URL: {}", url);
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| anyhow::anyhow!("Qdrant client build failed: {}", e))?;

        let store = Self {
            client,
            collection_name: collection_name.to_string(),
        };

        store.ensure_collection().await?;
        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<()> {
        if !self.client.collection_exists(&self.collection_name).await? {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection_name)
                        .vectors_config(VectorParamsBuilder::new(EMBEDDING_DIM, Distance::Cosine)),
                )
                .await?;
        }
        Ok(())
    }

    pub async fn add_chunk(
        &self,
        source_label: &str,
        chunk_index: usize,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<()> {
        let mut payload_map = JsonMap::new();
        payload_map.insert("text".to_string(), JsonValue::String(text.to_string()));
        payload_map.insert(
            "source".to_string(),
            JsonValue::String(source_label.to_string()),
        );
        payload_map.insert("chunk_index".to_string(), JsonValue::from(chunk_index));

        let id = chunk_point_id(source_label, chunk_index);
        let point = PointStruct::new(id, embedding, payload_map);

        self.client
            .upsert_points(qdrant_client::qdrant::UpsertPointsBuilder::new(
                &self.collection_name,
                vec![point],
            ))
            .await?;

        Ok(())
    }

    pub async fn search(&self, query_vector: Vec<f32>, limit: u64) -> Result<Vec<RetrievedPassage>> {
        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection_name, query_vector, limit)
                    .with_payload(true),
            )
            .await?;

        let mut passages = Vec::new();
        for point in search_result.result {
            let text = match point.payload.get("text").and_then(|v| v.as_str()) {
                Some(t) => t.to_string(),
                None => continue,
            };
            let source_label = point
                .payload
                .get("source")
                .and_then(|v| v.as_str())
                .map(String::as_str)
                .unwrap_or("desconocido")
                .to_string();
            passages.push(RetrievedPassage { text, source_label });
        }

        Ok(passages)
    }

    /// Number of points in the collection. Zero means no persisted index.
    pub async fn count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(&self.collection_name)
            .await?
            .result
            .ok_or_else(|| anyhow::anyhow!("Qdrant returned no collection info"))?;
        Ok(info.points_count.unwrap_or(0))
    }

    /// Drops and recreates the collection (explicit rebuild).
    pub async fn reset(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection_name).await? {
            self.client.delete_collection(&self.collection_name).await?;
        }
        self.ensure_collection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_point_ids_are_deterministic_and_distinct() {
        let a = chunk_point_id("obra.json", 0);
        let b = chunk_point_id("obra.json", 0);
        let c = chunk_point_id("obra.json", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // Must be a valid UUID string for Qdrant.
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
