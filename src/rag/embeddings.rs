use anyhow::Result;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

/// In-process sentence embeddings. all-MiniLM-L6-v2, 384 dimensions, the same
/// model the index was built with.
pub struct EmbeddingGenerator {
    model: TextEmbedding,
}

pub const EMBEDDING_DIM: u64 = 384;

impl EmbeddingGenerator {
    pub fn new() -> Result<Self> {
        tracing::info!("Initializing embedding model (all-MiniLM-L6-v2)...");

        let model = TextEmbedding::try_new(InitOptions {
            model_name: EmbeddingModel::AllMiniLML6V2,
            show_download_progress: false,
            ..Default::default()
        })
        .map_err(|e| anyhow::anyhow!("Failed to initialize embedding model: {}", e))?;

        tracing::info!("Embedding model initialized");
        Ok(Self { model })
    }

    pub fn generate(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.model.embed(texts, None)?;
        Ok(embeddings)
    }

    pub fn generate_single(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.generate(vec![text.to_string()])?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedding model returned no vector"))
    }
}
