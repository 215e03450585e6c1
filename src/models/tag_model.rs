//! models/tag_model.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreate {
    pub tag_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagRead {
    pub id: String,
    pub tenant_id: String,
    pub tag_name: String,
}

/// Candidato de la búsqueda vectorial de tags
#[derive(Debug, Clone, Serialize)]
pub struct TagMatch {
    pub id: String,
    pub tag_name: String,
    pub similarity: f32,
}
