//! models/product_model.rs
//! Productos del catálogo y la ingesta de menús.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub product_name: String,
    pub description: Option<String>,
    pub list_price: f64,
    pub floor_price: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProductCreate {
    /// list_price > 0; floor_price (si viene) > 0
    pub fn validate(&self) -> Result<(), String> {
        if self.product_name.trim().is_empty() {
            return Err("product_name must not be empty".to_string());
        }
        if !(self.list_price > 0.0) {
            return Err("list_price must be greater than 0".to_string());
        }
        if let Some(floor) = self.floor_price {
            if !(floor > 0.0) {
                return Err("floor_price must be greater than 0".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRead {
    pub id: String,
    pub tenant_id: String,
    pub product_name: String,
    pub description: Option<String>,
    pub list_price: f64,
    pub floor_price: Option<f64>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub generated_description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuIngestRequest {
    pub menu_text: String,
}

/// Resultado de la ingesta por lotes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuIngestSummary {
    pub message: String,
    pub total_identified: usize,
    pub successfully_created: usize,
    pub failed: usize,
}
