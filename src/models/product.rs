// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// Produto de catálogo. Criado no primeiro uso e reaproveitado pelo nome.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Produto X")]
    pub name: String,
    #[schema(example = "cx")]
    pub unit: String,
    #[schema(example = "10")]
    pub quantity: Decimal,
    #[schema(example = "5.00")]
    pub price: Decimal,
    pub commission: Decimal,
    pub icms: Decimal,
    pub ipi: Decimal,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
}
