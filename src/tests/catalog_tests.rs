//! tests/catalog_tests.rs
//! Negocios, tags, productos, menús, conocimiento y promociones.

use serde_json::json;

use crate::errors::AppError;
use crate::models::product_model::{MenuIngestSummary, ProductCreate};
use crate::models::promotion_model::PromotionCreate;
use crate::services::llm_service::GenerationMode;
use crate::services::product_service::fallback_description;
use crate::tests::support::{business_request, sample_business, test_context, TEST_PHONE_NUMBER_ID};

fn app_error(e: &anyhow::Error) -> &AppError {
    e.downcast_ref::<AppError>().expect("AppError")
}

fn product(name: &str, price: f64) -> ProductCreate {
    serde_json::from_value(json!({
        "product_name": name,
        "description": "Double shot",
        "list_price": price
    }))
    .unwrap()
}

#[actix_rt::test]
async fn duplicate_phone_number_id_is_a_conflict() {
    let ctx = test_context().await;
    sample_business(&ctx).await;

    let err = ctx
        .services
        .business
        .create_business(business_request(TEST_PHONE_NUMBER_ID))
        .await
        .unwrap_err();
    assert!(matches!(app_error(&err), AppError::Conflict(_)));
}

#[actix_rt::test]
async fn missing_business_is_not_found() {
    let ctx = test_context().await;
    let err = ctx.services.business.get_business("nope").await.unwrap_err();
    assert!(matches!(app_error(&err), AppError::NotFound(_)));
}

#[actix_rt::test]
async fn tags_are_lowercased_and_unique_per_tenant() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;

    let tag = ctx.services.tags.create_tag(&business.id, "  Vegan ").await.unwrap();
    assert_eq!(tag.tag_name, "vegan");

    let err = ctx.services.tags.create_tag(&business.id, "VEGAN").await.unwrap_err();
    assert!(matches!(app_error(&err), AppError::Conflict(_)));

    let err = ctx.services.tags.create_tag(&business.id, "   ").await.unwrap_err();
    assert!(matches!(app_error(&err), AppError::Validation(_)));

    let err = ctx.services.tags.create_tag("ghost", "vegan").await.unwrap_err();
    assert!(matches!(app_error(&err), AppError::NotFound(_)));

    // El mismo nombre en otro tenant es válido
    let other = ctx
        .services
        .business
        .create_business(business_request("PHONE_ID_2"))
        .await
        .unwrap();
    ctx.services.tags.create_tag(&other.id, "vegan").await.unwrap();

    let tags = ctx.services.tags.list_tags(&business.id).await.unwrap();
    assert_eq!(tags.len(), 1);
}

#[actix_rt::test]
async fn reconcile_reuses_existing_tags_and_dedups() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    let coffee = ctx.services.tags.create_tag(&business.id, "coffee").await.unwrap();

    let names: Vec<String> = ["Coffee", "hot drinks", "HOT DRINKS", "", "coffee"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let ids = ctx
        .services
        .tagging
        .reconcile_tags(&business.id, &names)
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], coffee.id);

    let tags = ctx.services.tags.list_tags(&business.id).await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.tag_name.as_str()).collect();
    assert_eq!(names, vec!["coffee", "hot drinks"]);
}

#[actix_rt::test]
async fn reconcile_skips_tags_it_cannot_embed() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.embedder.fail_all();

    let ids = ctx
        .services
        .tagging
        .reconcile_tags(&business.id, &["new tag".to_string()])
        .await
        .unwrap();
    assert!(ids.is_empty());
}

#[actix_rt::test]
async fn product_creation_runs_the_full_workflow() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.services.tags.create_tag(&business.id, "coffee").await.unwrap();

    ctx.text
        .respond_to("creative copywriter", "A bold, velvety espresso for mornings.");
    ctx.text.respond_to(
        "retail product classifier",
        r#"{"final_tags": ["coffee", "Espresso", "espresso"]}"#,
    );

    let record = ctx
        .services
        .products
        .create_product(&business.id, product("Espresso", 250.0))
        .await
        .unwrap();
    assert_eq!(
        record.generated_description.as_deref(),
        Some("A bold, velvety espresso for mornings.")
    );
    assert!(record.is_active);

    let tag_ids = ctx
        .services
        .products
        .list_tag_ids_for_product(&record.id)
        .await
        .unwrap();
    assert_eq!(tag_ids.len(), 2);

    let (mode, _) = ctx.text.prompt_containing("retail product classifier").unwrap();
    assert_eq!(mode, GenerationMode::Thinking);
    let (mode, _) = ctx.text.prompt_containing("creative copywriter").unwrap();
    assert_eq!(mode, GenerationMode::Fast);
}

#[actix_rt::test]
async fn product_description_falls_back_without_llm() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;

    let record = ctx
        .services
        .products
        .create_product(&business.id, product("Espresso", 250.0))
        .await
        .unwrap();
    assert_eq!(
        record.generated_description.as_deref(),
        Some("Espresso. Double shot")
    );
    assert_eq!(fallback_description("Espresso", None), "Espresso.");
}

#[actix_rt::test]
async fn product_validation_and_embedding_failures() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;

    let err = ctx
        .services
        .products
        .create_product(&business.id, product("Espresso", 0.0))
        .await
        .unwrap_err();
    assert!(matches!(app_error(&err), AppError::Validation(_)));

    ctx.embedder.fail_all();
    let err = ctx
        .services
        .products
        .create_product(&business.id, product("Espresso", 250.0))
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<AppError>().is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_rt::test]
async fn menu_ingestion_counts_successes_and_failures() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.text.respond_to(
        "menu data entry system",
        r#"{"products": [
            {"product_name": "Latte", "description": "Milky", "list_price": 300, "is_active": true},
            {"product_name": "Croissant", "list_price": 200},
            {"product_name": "Free Water", "list_price": 0},
            {"description": "no name"}
        ]}"#,
    );

    let summary = ctx
        .services
        .menu_ingestion
        .ingest_menu_from_text(&business.id, "LATTE 300\nCROISSANT 200\nWATER free")
        .await
        .unwrap();
    assert_eq!(
        summary,
        MenuIngestSummary {
            message: "Batch product ingestion complete.".to_string(),
            total_identified: 4,
            successfully_created: 2,
            failed: 2,
        }
    );
}

#[actix_rt::test]
async fn menu_ingestion_with_nothing_identified() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;

    let summary = ctx
        .services
        .menu_ingestion
        .ingest_menu_from_text(&business.id, "Open 7am to 7pm")
        .await
        .unwrap();
    assert_eq!(
        summary.message,
        "AI failed to identify any products in the provided text."
    );
    assert_eq!(summary.total_identified, 0);

    let err = ctx
        .services
        .menu_ingestion
        .ingest_menu_from_text(&business.id, "  ")
        .await
        .unwrap_err();
    assert!(matches!(app_error(&err), AppError::Validation(_)));
}

#[actix_rt::test]
async fn knowledge_ingestion_stores_chunks() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.text.respond_to(
        "data pre-processor",
        "```json\n{\"knowledge_chunks\": [\"We open at 7am.\", \"  \", \"Parking is free.\"]}\n```",
    );

    let created = ctx
        .services
        .knowledge
        .ingest_text_knowledge(&business.id, "We open at 7am. Parking is free.", Some("faq"))
        .await
        .unwrap();
    assert_eq!(created, 2);

    let sources: Vec<Option<String>> =
        sqlx::query_scalar("SELECT source_document_name FROM knowledge")
            .fetch_all(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(sources, vec![Some("faq".to_string()); 2]);
}

#[actix_rt::test]
async fn knowledge_ingestion_without_chunks_stores_nothing() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.text.respond_to("data pre-processor", "not json at all");

    let created = ctx
        .services
        .knowledge
        .ingest_text_knowledge(&business.id, "Some text", None)
        .await
        .unwrap();
    assert_eq!(created, 0);

    let err = ctx
        .services
        .knowledge
        .ingest_text_knowledge("ghost", "Some text", None)
        .await
        .unwrap_err();
    assert!(matches!(app_error(&err), AppError::NotFound(_)));
}

#[actix_rt::test]
async fn knowledge_ingestion_rejects_missing_embeddings() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;
    ctx.text.respond_to(
        "data pre-processor",
        r#"{"knowledge_chunks": ["We open at 7am.", "Parking is free."]}"#,
    );
    ctx.embedder.truncate_batches_to(1);

    let err = ctx
        .services
        .knowledge
        .ingest_text_knowledge(&business.id, "We open at 7am. Parking is free.", None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("2 chunks but 1 embeddings"));

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM knowledge")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

fn promotion(body: serde_json::Value) -> PromotionCreate {
    serde_json::from_value(body).unwrap()
}

#[test]
fn promotion_requires_exactly_one_discount() {
    let both = promotion(json!({
        "promo_description": "Happy hour",
        "discount_percentage": 10.0,
        "discount_amount": 50.0
    }));
    assert_eq!(
        both.validate().unwrap_err(),
        "Provide either 'discount_percentage' or 'discount_amount', not both."
    );

    let none = promotion(json!({ "promo_description": "Happy hour" }));
    assert_eq!(
        none.validate().unwrap_err(),
        "Either 'discount_percentage' or 'discount_amount' must be provided."
    );

    assert!(promotion(json!({ "promo_description": "x", "discount_percentage": 150.0 }))
        .validate()
        .is_err());
    assert!(promotion(json!({ "promo_description": "x", "discount_amount": -5.0 }))
        .validate()
        .is_err());
    assert!(promotion(json!({
        "promo_description": "x",
        "discount_percentage": 100.0,
        "start_date": "2025-02-01T00:00:00Z",
        "end_date": "2025-01-01T00:00:00Z"
    }))
    .validate()
    .is_err());
    assert!(promotion(json!({ "promo_description": "x", "discount_percentage": 100.0 }))
        .validate()
        .is_ok());

    let bad_date = serde_json::from_value::<PromotionCreate>(json!({
        "promo_description": "x",
        "discount_percentage": 10.0,
        "start_date": "next tuesday"
    }));
    assert!(bad_date.is_err());
}

#[actix_rt::test]
async fn promotion_is_stored_for_the_business() {
    let ctx = test_context().await;
    let business = sample_business(&ctx).await;

    let promo = ctx
        .services
        .promotions
        .create_promotion(
            &business.id,
            promotion(json!({
                "promo_description": "Two for one",
                "discount_amount": 100.0,
                "start_date": "2025-01-01T00:00:00Z"
            })),
        )
        .await
        .unwrap();
    assert_eq!(promo.business_id, business.id);
    assert!(promo.is_active);

    let naive = ctx
        .services
        .promotions
        .create_promotion(
            &business.id,
            promotion(json!({
                "promo_description": "Morning deal",
                "discount_percentage": 15.0,
                "start_date": "2025-01-01T00:00:00",
                "end_date": "2025-01-31 18:30:00"
            })),
        )
        .await
        .unwrap();
    assert!(naive
        .start_date
        .as_deref()
        .unwrap()
        .starts_with("2025-01-01T00:00:00"));
    assert!(naive.end_date.as_deref().unwrap().starts_with("2025-01-31T18:30:00"));

    let err = ctx
        .services
        .promotions
        .create_promotion(
            &business.id,
            promotion(json!({
                "promo_description": "Ghost product",
                "product_id": "no-such-product",
                "discount_percentage": 5.0
            })),
        )
        .await
        .unwrap_err();
    assert!(matches!(app_error(&err), AppError::NotFound(_)));
}
