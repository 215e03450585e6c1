//! models/knowledge_model.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeIngestRequest {
    pub text_content: String,
    pub source_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeIngestResponse {
    pub message: String,
    pub chunks_created: usize,
}

/// Lo que el chunker del LLM debe devolver
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeChunks {
    pub knowledge_chunks: Vec<String>,
}
