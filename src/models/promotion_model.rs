//! models/promotion_model.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

fn default_true() -> bool {
    true
}

/// RFC 3339 o fecha sin zona ("2025-01-01T00:00:00"), que se toma como UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_optional_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime '{}'", raw))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromotionCreate {
    pub promo_description: String,
    /// Puede ir atada a un producto o ser general
    pub product_id: Option<String>,
    pub discount_percentage: Option<f64>,
    pub discount_amount: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl PromotionCreate {
    /// Exactamente uno de `discount_percentage` o `discount_amount`.
    pub fn validate(&self) -> Result<(), String> {
        if self.promo_description.trim().is_empty() {
            return Err("promo_description must not be empty".to_string());
        }
        match (self.discount_percentage, self.discount_amount) {
            (Some(_), Some(_)) => {
                return Err(
                    "Provide either 'discount_percentage' or 'discount_amount', not both."
                        .to_string(),
                )
            }
            (None, None) => {
                return Err(
                    "Either 'discount_percentage' or 'discount_amount' must be provided."
                        .to_string(),
                )
            }
            (Some(p), None) if !(p > 0.0 && p <= 100.0) => {
                return Err("discount_percentage must be > 0 and <= 100".to_string())
            }
            (None, Some(a)) if !(a > 0.0) => {
                return Err("discount_amount must be greater than 0".to_string())
            }
            _ => {}
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err("end_date must not be before start_date".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromotionRead {
    pub id: String,
    pub business_id: String,
    pub promo_description: String,
    pub product_id: Option<String>,
    pub discount_percentage: Option<f64>,
    pub discount_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}
