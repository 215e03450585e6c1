//! tests/realtime_tests.rs
//! Flujo completo de un mensaje entrante, con LLM y embeddings simulados.

use std::time::Duration;

use serde_json::{json, Value};

use crate::models::queue_model::{
    QueueKind, EVENT_NEW_INBOUND_MESSAGE, EVENT_SEND_OUTBOUND_MESSAGE, TASK_EXECUTE_WHATSAPP_SEND,
    TASK_RUN_PROFILING_ANALYSIS,
};
use crate::services::llm_service::GenerationMode;
use crate::services::realtime_service::{build_action_plan_prompt, LlmContext};
use crate::tests::support::{
    axis, config_from, inbound_text_payload, sample_business, test_context, test_context_with,
    TEST_PHONE_NUMBER_ID, TEST_VERIFY_TOKEN,
};
use crate::worker::Worker;

const USER_PHONE: &str = "254711111111";
const PLAN_WITH_PROFILING: &str = r#"```json
{
  "response_text": "Hi Ana! We open at 7am every day.",
  "tool_calls": [
    { "name": "queue_for_profiling", "arguments": { "summary_of_new_info": "Ana loves espresso." } }
  ]
}
```"#;

fn worker_for(ctx: &crate::tests::support::TestContext) -> Worker {
    Worker::new(ctx.services.clone(), Duration::from_millis(10), true)
}

fn payload_of(record: &crate::models::queue_model::QueueRecord) -> Value {
    serde_json::from_str(&record.payload).unwrap()
}

#[actix_rt::test]
async fn inbound_message_flows_through_all_queues() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    let coffee = ctx.services.tags.create_tag(&business.id, "Coffee").await.unwrap();

    ctx.text.respond_to("ActionPlan", PLAN_WITH_PROFILING);
    ctx.text
        .respond_to("customer analyst", r#"{"inferred_tags": ["coffee", "tea"]}"#);

    ctx.services
        .queue
        .enqueue(
            QueueKind::Dispatcher,
            EVENT_NEW_INBOUND_MESSAGE,
            &inbound_text_payload(TEST_PHONE_NUMBER_ID, USER_PHONE, "Ana", "When do you open?"),
        )
        .await
        .unwrap();

    let worker = worker_for(&ctx);

    // dispatcher -> realtime (handle_user_message)
    assert!(worker.process_dispatcher_once().await.unwrap());
    assert!(worker.process_realtime_once().await.unwrap());

    let realtime = ctx.services.queue.list(QueueKind::Realtime).await.unwrap();
    assert_eq!(realtime.len(), 1);
    assert_eq!(realtime[0].status, "complete");

    // Cliente creado y conversación guardada
    let customer = ctx
        .services
        .business
        .find_customer(&business.id, USER_PHONE)
        .await
        .unwrap()
        .expect("customer created");
    assert_eq!(customer.customer_name, "Ana");

    let history = ctx.services.business.recent_history(&customer.id, 8).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, "user");
    assert_eq!(history[0].content, "When do you open?");
    assert_eq!(history[1].role, "assistant");
    assert_eq!(history[1].content, "Hi Ana! We open at 7am every day.");

    // Evento saliente en el dispatcher
    let events = ctx.services.queue.list(QueueKind::Dispatcher).await.unwrap();
    let outbound = events
        .iter()
        .find(|e| e.event_type == EVENT_SEND_OUTBOUND_MESSAGE)
        .expect("outbound event");
    assert_eq!(
        payload_of(outbound),
        json!({
            "data": {
                "messaging_product": "whatsapp",
                "to": USER_PHONE,
                "type": "text",
                "text": { "body": "Hi Ana! We open at 7am every day." }
            },
            "config": { "channel": "whatsapp", "business_id": business.id }
        })
    );

    // dispatcher -> realtime (execute_whatsapp_send), simulado por DEV_MODE
    assert!(worker.process_dispatcher_once().await.unwrap());
    assert!(worker.process_realtime_once().await.unwrap());
    let realtime = ctx.services.queue.list(QueueKind::Realtime).await.unwrap();
    assert_eq!(realtime.len(), 2);
    assert_eq!(realtime[1].event_type, TASK_EXECUTE_WHATSAPP_SEND);
    assert_eq!(realtime[1].status, "complete");

    // Perfilado
    let profiling = ctx.services.queue.list(QueueKind::Profiling).await.unwrap();
    assert_eq!(profiling.len(), 1);
    assert_eq!(profiling[0].event_type, TASK_RUN_PROFILING_ANALYSIS);
    let task = payload_of(&profiling[0]);
    assert_eq!(task["customer_id"], json!(customer.id));
    assert_eq!(task["business_id"], json!(business.id));
    assert_eq!(task["summary"], json!("Ana loves espresso."));
    assert_eq!(
        task["full_conversation"],
        json!([{ "role": "user", "content": "When do you open?" }])
    );

    assert!(worker.process_profiling_once().await.unwrap());
    let profiling = ctx.services.queue.list(QueueKind::Profiling).await.unwrap();
    assert_eq!(profiling[0].status, "complete");
    assert_eq!(
        ctx.services
            .profiling
            .interest_score(&customer.id, &coffee.id)
            .await
            .unwrap(),
        Some(1.0)
    );

    // Nada más pendiente
    assert!(!worker.process_dispatcher_once().await.unwrap());
    assert!(!worker.process_realtime_once().await.unwrap());
    assert!(!worker.process_profiling_once().await.unwrap());
}

#[actix_rt::test]
async fn returning_customer_is_reused_and_history_reaches_prompt() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.text.respond_to(
        "ActionPlan",
        r#"{"response_text": "Sure!", "tool_calls": []}"#,
    );

    let first = inbound_text_payload(TEST_PHONE_NUMBER_ID, USER_PHONE, "Ana", "Hello");
    let second = inbound_text_payload(TEST_PHONE_NUMBER_ID, USER_PHONE, "Ana", "Any cake today?");

    let a = ctx.services.realtime.handle_user_message(&first).await.unwrap();
    let b = ctx.services.realtime.handle_user_message(&second).await.unwrap();
    assert_eq!(a.customer_id, b.customer_id);
    assert_eq!(a.business_id, business.id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let prompts: Vec<String> = ctx
        .text
        .prompts()
        .into_iter()
        .filter(|p| p.contains("Any cake today?"))
        .collect();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(r#"{"role":"assistant","content":"Sure!"}"#));
    assert!(prompts[0].contains("Kahawa House"));
    assert!(prompts[0].contains("You are a helpful assistant."));
}

#[actix_rt::test]
async fn relevant_knowledge_is_added_to_the_prompt() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;

    ctx.text.respond_to(
        "data pre-processor",
        r#"{"knowledge_chunks": ["We open at 7am every day.", "Delivery is free above 1000 KES."]}"#,
    );
    ctx.embedder.set("We open at 7am every day.", axis(1));
    ctx.embedder.set("Delivery is free above 1000 KES.", axis(2));
    ctx.embedder.set("When do you open?", axis(1));
    ctx.text.respond_to("ActionPlan", r#"{"response_text": "7am!", "tool_calls": []}"#);

    ctx.services
        .knowledge
        .ingest_text_knowledge(&business.id, "Hours and delivery policy", Some("faq.txt"))
        .await
        .unwrap();

    ctx.services
        .realtime
        .handle_user_message(&inbound_text_payload(
            TEST_PHONE_NUMBER_ID,
            USER_PHONE,
            "Ana",
            "When do you open?",
        ))
        .await
        .unwrap();

    let (_, prompt) = ctx.text.prompt_containing("ActionPlan").unwrap();
    assert!(prompt.contains("We open at 7am every day."));
    assert!(!prompt.contains("Delivery is free"));
}

#[actix_rt::test]
async fn query_expansion_uses_the_refined_query_for_search() {
    let config = config_from(&[
        ("OPENAI_API_KEY", "sk-test"),
        ("VERIFY_TOKEN", TEST_VERIFY_TOKEN),
        ("DEV_MODE", "true"),
        ("QUERY_EXPANSION", "true"),
    ]);
    let ctx = test_context_with(config).await;
    let business = sample_business(&ctx).await;

    ctx.text.respond_to(
        "data pre-processor",
        r#"{"knowledge_chunks": ["Cakes are baked fresh every morning."]}"#,
    );
    ctx.embedder.set("Cakes are baked fresh every morning.", axis(3));
    ctx.embedder.set("fresh cake, bakery, desserts", axis(3));
    ctx.text
        .respond_to("Search Query Expansion", "fresh cake, bakery, desserts");
    ctx.text.respond_to("ActionPlan", r#"{"response_text": "Yes!", "tool_calls": []}"#);

    ctx.services
        .knowledge
        .ingest_text_knowledge(&business.id, "Bakery notes", None)
        .await
        .unwrap();
    ctx.services
        .realtime
        .handle_user_message(&inbound_text_payload(
            TEST_PHONE_NUMBER_ID,
            USER_PHONE,
            "Ana",
            "anything sweet?",
        ))
        .await
        .unwrap();

    let (mode, _) = ctx.text.prompt_containing("Search Query Expansion").unwrap();
    assert_eq!(mode, GenerationMode::Fast);
    let (_, prompt) = ctx.text.prompt_containing("ActionPlan").unwrap();
    assert!(prompt.contains("Cakes are baked fresh every morning."));
}

#[actix_rt::test]
async fn unknown_business_fails_the_task() {
    let ctx = test_context().await;
    sample_business(&ctx).await;
    ctx.services
        .queue
        .enqueue(
            QueueKind::Realtime,
            "handle_user_message",
            &inbound_text_payload("OTHER_PHONE_ID", USER_PHONE, "Ana", "Hi"),
        )
        .await
        .unwrap();

    assert!(worker_for(&ctx).process_realtime_once().await.unwrap());
    let task = &ctx.services.queue.list(QueueKind::Realtime).await.unwrap()[0];
    assert_eq!(task.status, "failed");
    assert!(task
        .last_error
        .as_deref()
        .unwrap()
        .contains("No business found with phone_number_id OTHER_PHONE_ID"));
}

#[actix_rt::test]
async fn invalid_action_plan_fails_the_task_without_replying() {
    let ctx = test_context().await;
    sample_business(&ctx).await;
    ctx.text.respond_to("ActionPlan", "Sorry, I cannot help with that.");
    ctx.services
        .queue
        .enqueue(
            QueueKind::Realtime,
            "handle_user_message",
            &inbound_text_payload(TEST_PHONE_NUMBER_ID, USER_PHONE, "Ana", "Hi"),
        )
        .await
        .unwrap();

    assert!(worker_for(&ctx).process_realtime_once().await.unwrap());
    let task = &ctx.services.queue.list(QueueKind::Realtime).await.unwrap()[0];
    assert_eq!(task.status, "failed");
    assert!(task
        .last_error
        .as_deref()
        .unwrap()
        .contains("LLM failed to produce a valid action plan"));
    assert!(ctx.services.queue.list(QueueKind::Dispatcher).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn plan_without_reply_only_queues_tools() {
    let ctx = test_context().await;
    sample_business(&ctx).await;
    ctx.text.respond_to(
        "ActionPlan",
        r#"{"response_text": "  ", "tool_calls": [
            {"name": "queue_for_profiling", "arguments": {"summary_of_new_info": "vegan"}},
            {"name": "request_human_intervention", "arguments": {"reason": "refund"}}
        ]}"#,
    );

    let outcome = ctx
        .services
        .realtime
        .handle_user_message(&inbound_text_payload(
            TEST_PHONE_NUMBER_ID,
            USER_PHONE,
            "Ana",
            "I'm vegan and want a refund",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.outbound_event_id, None);
    assert_eq!(outcome.profiling_task_ids.len(), 1);
    assert!(ctx.services.queue.list(QueueKind::Dispatcher).await.unwrap().is_empty());
    let history = ctx
        .services
        .business
        .recent_history(&outcome.customer_id, 8)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[actix_rt::test]
async fn unknown_realtime_event_type_is_failed() {
    let ctx = test_context().await;
    ctx.services
        .queue
        .enqueue(QueueKind::Realtime, "send_fax", &json!({}))
        .await
        .unwrap();

    assert!(worker_for(&ctx).process_realtime_once().await.unwrap());
    let task = &ctx.services.queue.list(QueueKind::Realtime).await.unwrap()[0];
    assert_eq!(task.status, "failed");
    assert_eq!(
        task.last_error.as_deref(),
        Some("Unknown event_type in realtime_tasks: send_fax")
    );
}

#[actix_rt::test]
async fn prompt_layers_identity_rules_persona_and_context() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    let context = LlmContext {
        rag_knowledge: vec!["Wifi password is on the receipt.".to_string()],
        ..LlmContext::default()
    };

    let prompt = build_action_plan_prompt(&business, &context, "wifi?");
    assert!(prompt.contains("Your name is Astro"));
    assert!(prompt.contains("Kahawa House"));
    assert!(prompt.contains("Wifi password is on the receipt."));
    assert!(prompt.contains(r#""wifi?""#));
}

#[actix_rt::test]
async fn contact_without_profile_name_uses_the_phone_as_name() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.text.respond_to(
        "ActionPlan",
        r#"{"response_text": "Hi!", "tool_calls": []}"#,
    );

    let mut payload = inbound_text_payload(TEST_PHONE_NUMBER_ID, USER_PHONE, "Ana", "Hello");
    payload["entry"][0]["changes"][0]["value"]["contacts"][0]
        .as_object_mut()
        .unwrap()
        .remove("profile");

    ctx.services.realtime.handle_user_message(&payload).await.unwrap();

    let customer = ctx
        .services
        .business
        .find_customer(&business.id, USER_PHONE)
        .await
        .unwrap()
        .expect("customer created");
    assert_eq!(customer.customer_name, USER_PHONE);
}
