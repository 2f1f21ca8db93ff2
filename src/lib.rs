//! # coachrag — Local study-coach RAG core
//!
//! Retrieval-Augmented Generation pipeline for a local study assistant:
//! course text is chunked, embedded and persisted in a flat vector store,
//! then questions are answered by a locally-hosted language model grounded
//! strictly in the retrieved course context.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, defaults
//! - **[`chunker`]** — Overlapping character-window chunking of course text
//! - **[`store`]** — File-backed flat inner-product vector store (index + parallel metadata)
//! - **[`retriever`]** — Lexical Jaccard-overlap retrieval (no persistent index)
//! - **[`chain`]** — RAG orchestration: ingest (chunk → embed → store) and grounded answering
//! - **[`embedder`]** — Text embedding capability trait (injected, not implemented here)
//! - **[`generator`]** — Text generation capability trait (injected, not implemented here)
//! - **[`postprocess`]** — Answer cleanup (role markers, repetitions, first sentence)

pub mod chain;
pub mod chunker;
pub mod config;
pub mod embedder;
pub mod generator;
pub mod postprocess;
pub mod retriever;
pub mod store;
