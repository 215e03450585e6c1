//! models/action_plan_model.rs
//! Respuesta estructurada del LLM para un mensaje entrante.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const TOOL_QUEUE_FOR_PROFILING: &str = "queue_for_profiling";
pub const TOOL_LOOKUP_PRODUCT_INFO: &str = "lookup_product_info";
pub const TOOL_REQUEST_HUMAN_INTERVENTION: &str = "request_human_intervention";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    #[serde(default)]
    pub response_text: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl ActionPlan {
    /// Texto a enviar, ignorando respuestas vacías
    pub fn reply(&self) -> Option<&str> {
        self.response_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Esquema (formato OpenAPI de Gemini) para la generación con JSON forzado.
    pub fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "response_text": { "type": "STRING", "nullable": true },
                "tool_calls": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": {
                                "type": "STRING",
                                "enum": [
                                    TOOL_QUEUE_FOR_PROFILING,
                                    TOOL_LOOKUP_PRODUCT_INFO,
                                    TOOL_REQUEST_HUMAN_INTERVENTION
                                ]
                            },
                            "arguments": {
                                "type": "OBJECT",
                                "properties": {
                                    "summary_of_new_info": { "type": "STRING", "nullable": true },
                                    "query": { "type": "STRING", "nullable": true },
                                    "reason": { "type": "STRING", "nullable": true }
                                }
                            }
                        },
                        "required": ["name"]
                    }
                }
            },
            "required": ["tool_calls"]
        })
    }
}
