//! utils/json_parser.rs
//! Parser tolerante para el JSON que devuelven los LLMs.

use serde::de::DeserializeOwned;

/// Quita espacios y las cercas de markdown (```json ... ```) alrededor del texto.
pub fn strip_code_fences(text: &str) -> &str {
    let mut clean = text.trim();
    if let Some(rest) = clean.strip_prefix("```json") {
        clean = rest;
    } else if let Some(rest) = clean.strip_prefix("```") {
        clean = rest;
    }
    if let Some(rest) = clean.strip_suffix("```") {
        clean = rest;
    }
    clean.trim()
}

/// Parsea la respuesta del LLM a `T`. Devuelve `None` (y loguea) si no es JSON válido.
pub fn safe_json_from_llm<T: DeserializeOwned>(llm_response_text: &str) -> Option<T> {
    match serde_json::from_str::<T>(strip_code_fences(llm_response_text)) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(
                "JSON Decode Error: {}. Raw text: '{}'",
                e,
                llm_response_text
            );
            None
        }
    }
}
