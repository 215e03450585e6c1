//! services/realtime_service.rs
//! Atiende un mensaje entrante de punta a punta (tarea `handle_user_message`):
//! negocio -> cliente -> contexto -> plan del LLM -> ejecutar el plan.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

use crate::config::prompts::{ASSISTANT_NAME, CAPABILITY_PROMPT, SYSTEM_CORE_PROMPT};
use crate::models::action_plan_model::{ActionPlan, TOOL_QUEUE_FOR_PROFILING};
use crate::models::business_model::{BusinessRead, ConversationTurn, CustomerRecord, MemoryFact};
use crate::models::queue_model::{
    QueueKind, EVENT_SEND_OUTBOUND_MESSAGE, TASK_RUN_PROFILING_ANALYSIS,
};
use crate::models::whatsapp_model::{InboundMessage, OutboundTextMessage, CHANNEL_WHATSAPP};
use crate::services::business_service::BusinessService;
use crate::services::knowledge_service::KnowledgeService;
use crate::services::llm_service::AiClients;
use crate::services::query_service::QueryService;
use crate::services::queue_service::QueueService;

pub const HISTORY_LIMIT: i64 = 8;
pub const MEMORY_LIMIT: i64 = 10;
pub const RAG_MATCH_THRESHOLD: f32 = 0.72;
pub const RAG_MATCH_COUNT: usize = 3;

/// Contexto que recibe el LLM
#[derive(Debug, Clone, Default)]
pub struct LlmContext {
    pub history: Vec<ConversationTurn>,
    pub long_term_memory: Vec<MemoryFact>,
    pub rag_knowledge: Vec<String>,
}

/// Lo que quedó hecho al terminar la tarea
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeOutcome {
    pub business_id: String,
    pub customer_id: String,
    pub outbound_event_id: Option<String>,
    pub profiling_task_ids: Vec<String>,
}

#[derive(Clone)]
pub struct RealtimeService {
    business_service: BusinessService,
    knowledge_service: KnowledgeService,
    query_service: QueryService,
    queue_service: QueueService,
    ai: AiClients,
    query_expansion: bool,
}

impl RealtimeService {
    pub fn new(
        business_service: BusinessService,
        knowledge_service: KnowledgeService,
        query_service: QueryService,
        queue_service: QueueService,
        ai: AiClients,
        query_expansion: bool,
    ) -> Self {
        Self {
            business_service,
            knowledge_service,
            query_service,
            queue_service,
            ai,
            query_expansion,
        }
    }

    /// Cualquier error en los pasos 1, 2 o 4 hace fallar la tarea.
    pub async fn handle_user_message(&self, payload: &Value) -> Result<RealtimeOutcome> {
        log::info!("--- Realtime Task Processing STARTED ---");

        // Paso 1
        log::info!("[STEP 1/5] Deconstructing payload and fetching business...");
        let inbound = InboundMessage::from_payload(payload)
            .context("[STEP 1/5] FAILED. Could not deconstruct payload")?;
        let business = self
            .business_service
            .find_by_phone_number_id(&inbound.business_phone_number_id)
            .await?
            .ok_or_else(|| {
                anyhow!(
                    "[STEP 1/5] FAILED. No business found with phone_number_id {}",
                    inbound.business_phone_number_id
                )
            })?;
        log::info!("[STEP 1/5] Success. Operating for business ID: {}", business.id);

        // Paso 2
        log::info!(
            "[STEP 2/5] Finding or creating customer for phone: {}",
            inbound.user_phone
        );
        let customer = self
            .business_service
            .find_or_create_customer(
                &business.id,
                &inbound.user_phone,
                inbound.user_name.as_deref().unwrap_or(&inbound.user_phone),
            )
            .await
            .context("[STEP 2/5] FAILED to fetch or create customer")?;

        // Paso 3
        let context = self.gather_context(&business, &customer, &inbound.text).await;

        // Paso 4
        log::info!("[STEP 4/5] Calling LLM for unified action plan...");
        let prompt = build_action_plan_prompt(&business, &context, &inbound.text);
        let schema = ActionPlan::response_schema();
        let plan = self
            .ai
            .generate_structured::<ActionPlan>(&prompt, Some(&schema))
            .await
            .ok_or_else(|| anyhow!("LLM failed to produce a valid action plan. Aborting task."))?;
        log::info!("LLM returned valid action plan object: {:?}", plan);

        // Paso 5
        self.execute_action_plan(&business, &customer, &inbound, &context, &plan)
            .await
    }

    /// Nunca falla: lo que no se pueda leer queda vacío.
    pub async fn gather_context(
        &self,
        business: &BusinessRead,
        customer: &CustomerRecord,
        user_message: &str,
    ) -> LlmContext {
        log::info!("[STEP 3/5] Gathering context for LLM...");
        let mut context = LlmContext::default();

        match self
            .business_service
            .recent_history(&customer.id, HISTORY_LIMIT)
            .await
        {
            Ok(history) => context.history = history,
            Err(e) => log::warn!("Could not fetch conversation history: {:?}", e),
        }

        match self
            .business_service
            .memory_facts(&customer.id, MEMORY_LIMIT)
            .await
        {
            Ok(facts) => context.long_term_memory = facts,
            Err(e) => log::warn!("Could not fetch long-term memory: {:?}", e),
        }

        match self.fetch_rag_knowledge(business, &context.history, user_message).await {
            Ok(chunks) => context.rag_knowledge = chunks,
            Err(e) => log::warn!(
                "Could not fetch RAG knowledge. Proceeding without it. Error: {:?}",
                e
            ),
        }

        log::info!(
            "Context gathered: {} history, {} memory, {} RAG chunks.",
            context.history.len(),
            context.long_term_memory.len(),
            context.rag_knowledge.len()
        );
        context
    }

    async fn fetch_rag_knowledge(
        &self,
        business: &BusinessRead,
        history: &[ConversationTurn],
        user_message: &str,
    ) -> Result<Vec<String>> {
        if user_message.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query = if self.query_expansion {
            self.query_service
                .refine_user_query(
                    user_message,
                    &business.business_name,
                    business.business_bio.as_deref().unwrap_or(""),
                    history,
                )
                .await
        } else {
            user_message.to_string()
        };

        let embedding = self.ai.embedder.embed(&query).await?;
        self.knowledge_service
            .match_knowledge(&business.id, &embedding, RAG_MATCH_THRESHOLD, RAG_MATCH_COUNT)
            .await
    }

    /// Primero responde, después encola tareas de fondo y guarda la conversación.
    async fn execute_action_plan(
        &self,
        business: &BusinessRead,
        customer: &CustomerRecord,
        inbound: &InboundMessage,
        context: &LlmContext,
        plan: &ActionPlan,
    ) -> Result<RealtimeOutcome> {
        log::info!("[STEP 5/5] Executing action plan.");
        let mut outcome = RealtimeOutcome {
            business_id: business.id.clone(),
            customer_id: customer.id.clone(),
            outbound_event_id: None,
            profiling_task_ids: Vec::new(),
        };

        let reply = plan.reply();

        if let Some(text) = reply {
            let message = OutboundTextMessage::new(&inbound.user_phone, text);
            let outbound_payload = json!({
                "data": message,
                "config": { "channel": CHANNEL_WHATSAPP, "business_id": business.id }
            });
            let event_id = self
                .queue_service
                .enqueue(QueueKind::Dispatcher, EVENT_SEND_OUTBOUND_MESSAGE, &outbound_payload)
                .await?;
            log::info!("Queued outbound message for {}.", inbound.user_phone);
            outcome.outbound_event_id = Some(event_id);
        }

        for tool_call in &plan.tool_calls {
            if tool_call.name != TOOL_QUEUE_FOR_PROFILING {
                log::info!(
                    "REALTIME: Tool '{}' has no background executor; arguments: {}",
                    tool_call.name,
                    tool_call.arguments
                );
                continue;
            }

            let mut full_conversation = context.history.clone();
            full_conversation.push(ConversationTurn {
                role: "user".to_string(),
                content: inbound.text.clone(),
            });
            let profiling_payload = json!({
                "customer_id": customer.id,
                "business_id": business.id,
                "summary": tool_call.argument_str("summary_of_new_info"),
                "full_conversation": full_conversation,
            });
            let task_id = self
                .queue_service
                .enqueue(QueueKind::Profiling, TASK_RUN_PROFILING_ANALYSIS, &profiling_payload)
                .await?;
            log::info!("Queued task for profiling customer {}.", customer.id);
            outcome.profiling_task_ids.push(task_id);
        }

        if let Some(text) = reply {
            self.business_service
                .append_conversation(
                    &customer.id,
                    &[
                        ConversationTurn {
                            role: "user".to_string(),
                            content: inbound.text.clone(),
                        },
                        ConversationTurn {
                            role: "assistant".to_string(),
                            content: text.to_string(),
                        },
                    ],
                )
                .await?;
        }

        log::info!("--- Realtime Task Processing COMPLETED ---");
        Ok(outcome)
    }
}

/// Prompt en capas: identidad, reglas del sistema, persona del negocio, contexto.
pub fn build_action_plan_prompt(business: &BusinessRead, context: &LlmContext, user_message: &str) -> String {
    let memory = serde_json::to_string(&context.long_term_memory).unwrap_or_else(|_| "[]".into());
    let knowledge = serde_json::to_string(&context.rag_knowledge).unwrap_or_else(|_| "[]".into());
    let history = serde_json::to_string(&context.history).unwrap_or_else(|_| "[]".into());

    format!(
        r#"
        **Your Identity:** Your name is {assistant}. You are a customer assistant representing {business_name}.

        {core_rules}

        **Your Capabilities:**
        {capabilities}

        ---
        **BUSINESS-SPECIFIC STYLE GUIDELINES (Adopt this tone):**
        {persona}
        ---

        **CONTEXT (Your ONLY source of truth):**
        - Long-Term Memory: {memory}
        - Business FAQs & Knowledge: {knowledge}

        **CONVERSATION HISTORY:**
        {history}

        **USER'S LATEST MESSAGE:**
        "{user_message}"

        **YOUR TASK:**
        1.  Adopt the persona of {assistant} as described in the style guidelines.
        2.  Follow your CORE OPERATIONAL RULES exactly.
        3.  Analyze the user's message based on the CONTEXT and HISTORY.
        4.  Generate a valid JSON object using the `ActionPlan` schema to define your response and any necessary tool calls.
        "#,
        assistant = ASSISTANT_NAME,
        business_name = business.business_name,
        core_rules = SYSTEM_CORE_PROMPT,
        capabilities = CAPABILITY_PROMPT,
        persona = business.system_prompt,
    )
}
