//! services/menu_ingestion_service.rs
//! Convierte un menú en texto libre en productos, uno por uno.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::product_model::{MenuIngestSummary, ProductCreate};
use crate::services::business_service::BusinessService;
use crate::services::llm_service::AiClients;
use crate::services::product_service::ProductService;

#[derive(Debug, Deserialize)]
struct MenuProductList {
    #[serde(default)]
    products: Vec<Value>,
}

#[derive(Clone)]
pub struct MenuIngestionService {
    product_service: ProductService,
    business_service: BusinessService,
    ai: AiClients,
}

impl MenuIngestionService {
    pub fn new(product_service: ProductService, business_service: BusinessService, ai: AiClients) -> Self {
        Self {
            product_service,
            business_service,
            ai,
        }
    }

    pub async fn ingest_menu_from_text(&self, tenant_id: &str, menu_text: &str) -> Result<MenuIngestSummary> {
        if menu_text.trim().is_empty() {
            return Err(AppError::Validation("menu_text must not be empty".to_string()).into());
        }
        self.business_service.ensure_exists(tenant_id).await?;
        log::info!("MENU INGESTION: Starting for tenant {}.", tenant_id);

        let raw_items = self.parse_menu_with_ai(menu_text).await;
        if raw_items.is_empty() {
            return Ok(MenuIngestSummary {
                message: "AI failed to identify any products in the provided text.".to_string(),
                total_identified: 0,
                successfully_created: 0,
                failed: 0,
            });
        }

        let total = raw_items.len();
        log::info!("MENU INGESTION: AI identified {} potential products.", total);

        let mut success_count = 0;
        let mut failure_count = 0;

        for raw in raw_items {
            // Cada item se valida por separado: uno malo no tumba el lote
            let product = match serde_json::from_value::<ProductCreate>(raw.clone()) {
                Ok(p) => p,
                Err(e) => {
                    log::error!("MENU INGESTION: Invalid product from AI {}: {}", raw, e);
                    failure_count += 1;
                    continue;
                }
            };

            let name = product.product_name.clone();
            match self.product_service.create_product(tenant_id, product).await {
                Ok(_) => success_count += 1,
                Err(e) => {
                    log::error!(
                        "MENU INGESTION: Failed to create product '{}'. Error: {:?}",
                        name,
                        e
                    );
                    failure_count += 1;
                }
            }
        }

        log::info!(
            "MENU INGESTION: Process complete. Success: {}, Failed: {}.",
            success_count,
            failure_count
        );
        Ok(MenuIngestSummary {
            message: "Batch product ingestion complete.".to_string(),
            total_identified: total,
            successfully_created: success_count,
            failed: failure_count,
        })
    }

    async fn parse_menu_with_ai(&self, menu_text: &str) -> Vec<Value> {
        let prompt = format!(
            r#"You are an expert menu data entry system. Your task is to read the following unstructured menu text and convert it into a structured list of products. Ignore all non-product text like headings, addresses, or opening hours. For each menu item, extract its name, a brief description if available, and its price.

    **Unstructured Menu Text:**
    {}

    **Your Task:**
    Strictly follow the provided JSON schema to structure your output. The `products` key must contain a list of all identified menu items.

    "#,
            menu_text
        );

        let schema = menu_schema();
        match self
            .ai
            .generate_structured::<MenuProductList>(&prompt, Some(&schema))
            .await
        {
            Some(list) => list.products,
            None => {
                log::error!("MENU INGESTION: AI failed to return a valid object with a 'products' attribute.");
                Vec::new()
            }
        }
    }
}

fn menu_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "products": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "product_name": { "type": "STRING" },
                        "description": { "type": "STRING", "nullable": true },
                        "list_price": { "type": "NUMBER" },
                        "floor_price": { "type": "NUMBER", "nullable": true },
                        "image_url": { "type": "STRING", "nullable": true },
                        "is_active": { "type": "BOOLEAN" }
                    },
                    "required": ["product_name", "list_price"]
                }
            }
        },
        "required": ["products"]
    })
}
