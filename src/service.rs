use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SotoError;
use crate::memory::ConversationStore;
use crate::models::RetrievedPassage;
use crate::prompt;

/// Seam to the vector index.
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    async fn retrieve(&self, question: &str, top_k: u64) -> Result<Vec<RetrievedPassage>>;
}

/// Seam to the language model.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Per-request pipeline: load history, retrieve passages, assemble the
/// prompt, call the model, persist the turn.
pub struct AnswerService {
    store: Arc<dyn ConversationStore>,
    retriever: Arc<dyn PassageRetriever>,
    generator: Arc<dyn AnswerGenerator>,
    history_limit: usize,
    top_k: u64,
}

impl AnswerService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        retriever: Arc<dyn PassageRetriever>,
        generator: Arc<dyn AnswerGenerator>,
        history_limit: usize,
        top_k: u64,
    ) -> Self {
        Self {
            store,
            retriever,
            generator,
            history_limit,
            top_k,
        }
    }

    pub async fn ask(&self, user_id: &str, pregunta: &str) -> Result<String, SotoError> {
        let pregunta = pregunta.trim();
        if pregunta.is_empty() {
            return Err(SotoError::EmptyQuestion);
        }

        let request_id = Uuid::new_v4();
        tracing::info!("[{}] pregunta de {}", request_id, user_id);

        // A read failure degrades to an empty history rather than refusing
        // to answer; only write failures after generation are of interest.
        let history = match self.store.recent(user_id, self.history_limit).await {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!("[{}] no se pudo cargar el historial: {}", request_id, e);
                Vec::new()
            }
        };

        let passages = self
            .retriever
            .retrieve(pregunta, self.top_k)
            .await
            .map_err(|e| {
                tracing::error!("[{}] fallo la recuperacion: {}", request_id, e);
                SotoError::Retrieval(e)
            })?;
        tracing::info!(
            "[{}] {} turnos de historial, {} pasajes recuperados",
            request_id,
            history.len(),
            passages.len()
        );

        let final_prompt = prompt::assemble(&history, &passages, pregunta);

        let respuesta = self.generator.complete(&final_prompt).await.map_err(|e| {
            tracing::error!("[{}] fallo el modelo: {}", request_id, e);
            SotoError::Generation(e)
        })?;

        // At-least-once answer delivery: a storage failure here is logged
        // and the already-generated answer still goes back to the caller.
        // The turn is simply not recorded.
        if let Err(e) = self.store.append(user_id, pregunta, &respuesta).await {
            tracing::error!("[{}] no se pudo guardar la conversacion: {}", request_id, e);
        }

        Ok(respuesta)
    }
}
