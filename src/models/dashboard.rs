// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;
use utoipa::{IntoParams, ToSchema};

use crate::models::{auth::Principal, deal::DealStatus};

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DashboardFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Só respeitado para administradores
    pub seller: Option<Uuid>,
}

impl DashboardFilter {
    pub fn scoped(mut self, principal: &Principal) -> Self {
        if !principal.is_admin() {
            self.seller = Some(principal.id);
        }
        self
    }

    /// Espera o alias `d` (deals) e uma cláusula WHERE já aberta.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(start) = self.start_date {
            qb.push(" AND d.created_at::date >= ").push_bind(start);
        }
        if let Some(end) = self.end_date {
            qb.push(" AND d.created_at::date <= ").push_bind(end);
        }
        if let Some(seller) = self.seller {
            qb.push(" AND d.seller_id = ").push_bind(seller);
        }
    }
}

// Linha crua do GROUP BY status
#[derive(Debug, Clone, FromRow)]
pub struct StatusTotals {
    pub status: DealStatus,
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCard {
    pub count: i64,
    pub total: Decimal,
}

// 1. Os cards do topo
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub quotes: StatusCard,
    pub sales: StatusCard,
    pub lost: StatusCard,
    /// finalizadas / (finalizadas + canceladas) × 100
    #[schema(example = "62.50")]
    pub conversion_rate: Decimal,
    #[schema(example = "1250.00")]
    pub average_ticket: Decimal,
}

/// Percentual com duas casas; zero quando não há base.
pub fn percentage(part: i64, whole: i64) -> Decimal {
    if whole <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(2)
}

impl DashboardSummary {
    pub fn from_totals(rows: &[StatusTotals]) -> Self {
        let mut summary = DashboardSummary::default();
        for row in rows {
            let card = StatusCard { count: row.count, total: row.total };
            match row.status {
                DealStatus::Pending => summary.quotes = card,
                DealStatus::Finalized => summary.sales = card,
                DealStatus::Cancelled => summary.lost = card,
            }
        }

        summary.conversion_rate = percentage(summary.sales.count, summary.sales.count + summary.lost.count);
        summary.average_ticket = if summary.sales.count > 0 {
            (summary.sales.total / Decimal::from(summary.sales.count)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        summary
    }
}

// 2. Desempenho por vendedor
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerPerformance {
    pub seller_id: Uuid,
    pub seller_name: String,
    pub quotes: i64,
    pub sales: i64,
    pub lost: i64,
    pub sales_total: Decimal,
    #[sqlx(skip)]
    pub conversion_rate: Decimal,
}

impl SellerPerformance {
    pub fn with_rate(mut self) -> Self {
        self.conversion_rate = percentage(self.sales, self.sales + self.lost);
        self
    }
}

// 3. Produtos mais vendidos (em R$)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
}

// 4. Clientes que mais compraram
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopClientEntry {
    pub client_id: Uuid,
    pub client_name: String,
    pub sales_count: i64,
    pub sales_total: Decimal,
}

// 5. Objeções das não-vendas
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectionEntry {
    pub objection: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;

    fn row(status: DealStatus, count: i64, total: i64) -> StatusTotals {
        StatusTotals { status, count, total: Decimal::from(total) }
    }

    #[test]
    fn summary_computes_rate_and_ticket() {
        let summary = DashboardSummary::from_totals(&[
            row(DealStatus::Pending, 4, 1000),
            row(DealStatus::Finalized, 5, 2500),
            row(DealStatus::Cancelled, 3, 900),
        ]);

        assert_eq!(summary.quotes.count, 4);
        assert_eq!(summary.sales.total, Decimal::from(2500));
        assert_eq!(summary.conversion_rate, Decimal::new(6250, 2));
        assert_eq!(summary.average_ticket, Decimal::from(500));
    }

    #[test]
    fn empty_summary_has_no_division_by_zero() {
        let summary = DashboardSummary::from_totals(&[row(DealStatus::Pending, 2, 100)]);
        assert_eq!(summary.conversion_rate, Decimal::ZERO);
        assert_eq!(summary.average_ticket, Decimal::ZERO);
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(1, 3), Decimal::new(3333, 2));
        assert_eq!(percentage(0, 0), Decimal::ZERO);
    }

    #[test]
    fn seller_rate_ignores_pending_quotes() {
        let perf = SellerPerformance {
            seller_id: Uuid::new_v4(),
            seller_name: "Ana".to_string(),
            quotes: 10,
            sales: 1,
            lost: 1,
            sales_total: Decimal::from(100),
            conversion_rate: Decimal::ZERO,
        }
        .with_rate();
        assert_eq!(perf.conversion_rate, Decimal::from(50));
    }

    #[test]
    fn dashboard_is_scoped_for_sellers() {
        let seller = Principal { id: Uuid::new_v4(), name: "Bia".to_string(), role: UserRole::Vendedor };
        let filter = DashboardFilter { seller: Some(Uuid::new_v4()), ..Default::default() }.scoped(&seller);
        assert_eq!(filter.seller, Some(seller.id));
    }
}
