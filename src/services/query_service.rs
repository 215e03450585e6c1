//! services/query_service.rs
//! Expansión de la consulta del usuario antes de la búsqueda vectorial.

use crate::models::business_model::ConversationTurn;
use crate::services::llm_service::{AiClients, GenerationMode};

#[derive(Clone)]
pub struct QueryService {
    ai: AiClients,
}

impl QueryService {
    pub fn new(ai: AiClients) -> Self {
        Self { ai }
    }

    /// Convierte el mensaje crudo en una consulta densa de palabras clave.
    /// Mensaje vacío -> ""; si el LLM no responde se usa el mensaje original.
    pub async fn refine_user_query(
        &self,
        raw_user_message: &str,
        business_name: &str,
        business_bio: &str,
        conversation_history: &[ConversationTurn],
    ) -> String {
        if raw_user_message.trim().is_empty() {
            log::warn!("Query Expansion: Raw message is empty, returning empty string.");
            return String::new();
        }
        log::info!("Query Expansion: Starting for raw message: '{}'", raw_user_message);

        let history = serde_json::to_string(conversation_history).unwrap_or_else(|_| "[]".into());
        let prompt = format!(
            r#"
    You are a Search Query Expansion Engine. Your expert task is to analyze a user's message in the chat context of a conversation and the business they are talking to to understand the user's intent, then generate a single, powerful descriptive search query string for our knowledge. This string should be semantically dense with relevant keywords to maximize the chance of finding a match in a vector database once the query is converted to embeddings.

    **BUSINESS CONTEXT:**
    - Name: {business_name}
    - Description: {business_bio}

    **RECENT CONVERSATION HISTORY (for context):**
    {history}

    **USER'S LATEST MESSAGE:**
    "{raw_user_message}"

    **INSTRUCTIONS:**
    1.  **Analyze True Intent:** Read the "USER'S LATEST MESSAGE" in the context of the "RECENT CONVERSATION HISTORY". Do not just rephrase the words; infer the user's underlying need.
    2.  **Brainstorm Keywords:** Based on the true intent, generate a list of diverse, relevant keywords and synonyms.
    3.  **Preserve Specifics:** ALWAYS include any specific names, numbers, or constraints from the user's message (e.g., "500 Ksh," "chocolate cake," "CBD").
    4.  **Construct the Final Query:** Combine all of this into a single, comma-separated string. The string should be a flat list of concepts. Do not use nested structures.

    **Example:**
    - User Message: "I'm looking for lunch and my budget is 500 bob"
    - Expanded Query: "Affordable lunch under 500 ksh, savory midday meal, cheap food options, value menu items"

    **Your Expanded Search Query:**
    "#
        );

        match self.ai.text.generate_text(&prompt, GenerationMode::Fast).await {
            Some(expanded) if !expanded.trim().is_empty() => {
                let final_query = expanded.trim().to_string();
                log::info!("Query Expansion: Final query for embedding is: '{}'", final_query);
                final_query
            }
            _ => {
                log::warn!(
                    "Query Expansion: LLM returned an empty query. Falling back to the original raw message."
                );
                raw_user_message.to_string()
            }
        }
    }
}
