//! RAG orchestration: ingest course documents and answer questions grounded
//! in the retrieved context.
//!
//! The chain owns no model state. Embedder and generator are capabilities
//! injected at construction, selected once at process start; the store is
//! shared behind `Arc` with whatever else reads it.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::chunker;
use crate::embedder::{Embedder, EmbedderError};
use crate::generator::{GenerationParams, Generator, GeneratorError};
use crate::postprocess::postprocess_answer;
use crate::store::{ChunkMetadata, StoreError, VectorStore};

/// Canned reply when a grounded chat has no course context to stand on.
pub const REFUSAL_REPLY: &str = "Je n’ai pas trouvé cela dans le cours.";

/// Tutor persona and grounding rules for the interactive chat path.
const CHAT_SYSTEM_PROMPT: &str = "Tu es Professeur Nour, un coach d’étude bienveillant. \
Réponds en français clair, structuré et concis (phrases simples). \
Tu t'appuies UNIQUEMENT sur le cours fourni dans le contexte. \
Si l'information n'est pas dans le cours, réponds: \"Je n’ai pas trouvé cela dans le cours.\" \
Si la question est floue, demande une précision. N'invente rien.";

/// A caller-supplied course document, ephemeral input to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub source: String,
}

/// A grounded answer: generated text plus the metadata of every retrieved
/// passage, in hit order.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context: Vec<ChunkMetadata>,
}

/// Errors from any stage of the pipeline. Generator failures propagate
/// unretried; fallback policy belongs to the caller.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error(transparent)]
    Embedder(#[from] EmbedderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

pub struct RagChain {
    embedder: Arc<dyn Embedder>,
    store: Arc<VectorStore>,
    generator: Arc<dyn Generator>,
}

impl RagChain {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
        }
    }

    /// Chunk, embed and store a batch of documents. Returns the number of
    /// chunks ingested. Documents that chunk to nothing are skipped; a batch
    /// producing zero chunks overall is a silent no-op.
    ///
    /// All chunks across all documents go through one embedder call and one
    /// store write.
    pub fn ingest(
        &self,
        documents: &[Document],
        chunk_size: usize,
        overlap: usize,
    ) -> Result<usize, ChainError> {
        let mut metas: Vec<ChunkMetadata> = Vec::new();
        for doc in documents {
            let chunks = chunker::split(&doc.text, chunk_size, overlap);
            if chunks.is_empty() {
                debug!("document {} produced no chunks, skipping", doc.source);
                continue;
            }
            metas.extend(chunks.into_iter().map(|c| ChunkMetadata {
                text: c.text,
                source: doc.source.clone(),
                offset: c.offset,
            }));
        }

        if metas.is_empty() {
            debug!("ingest batch produced no chunks, nothing to do");
            return Ok(0);
        }

        let texts: Vec<&str> = metas.iter().map(|m| m.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        let count = metas.len();
        self.store.add(&vectors, metas)?;

        info!("ingested {count} chunks from {} documents", documents.len());
        Ok(count)
    }

    /// Answer a question from the `k` nearest stored passages.
    ///
    /// Retrieved texts are joined by blank lines into a context block and
    /// wrapped in the fixed course-assistant prompt; the prompt shape and
    /// its "réponse concise en français" instruction are part of the
    /// contract, not per-call configuration.
    pub fn answer(
        &self,
        question: &str,
        k: usize,
        params: &GenerationParams,
    ) -> Result<Answer, ChainError> {
        let query = self.embedder.embed(question)?;
        let hits = self.store.search(&query, k)?;

        let context: Vec<ChunkMetadata> = hits
            .iter()
            .map(|hit| self.store.get(hit.index))
            .collect::<Result<_, _>>()?;

        let ctx = context
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt =
            format!("Contexte:\n{ctx}\n\nQuestion: {question}\nRéponse concise en français:");

        debug!("answering with {} retrieved passages", context.len());
        let text = self.generator.generate(&prompt, params)?;

        Ok(Answer { text, context })
    }

    /// Strictly grounded chat: refuse outright when no course context is
    /// supplied.
    ///
    /// The refusal is a hard precondition, not a hint — the generator is
    /// never invoked with an empty grounding context. Generated output is
    /// run through answer cleanup before being returned.
    pub fn chat_grounded(
        &self,
        question: &str,
        course_context: &str,
        params: &GenerationParams,
    ) -> Result<String, ChainError> {
        let course_context = course_context.trim();
        if course_context.is_empty() {
            info!("grounded chat refused: no course context supplied");
            return Ok(REFUSAL_REPLY.to_string());
        }

        let prompt = format!(
            "{CHAT_SYSTEM_PROMPT}\n\n\
             === CONTEXTE DU COURS ===\n{course_context}\n\n\
             === QUESTION DE L'ÉTUDIANT ===\n{question}\n\n\
             === RÉPONSE DU PROFESSEUR NOUR ===\n"
        );
        let raw = self.generator.generate(&prompt, params)?;
        Ok(postprocess_answer(&raw))
    }
}
