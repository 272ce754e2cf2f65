// src/models/client.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;
use utoipa::{IntoParams, ToSchema};

use crate::models::auth::Principal;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    #[schema(example = "Padaria Pão Quente")]
    pub name: String,

    // Sempre só dígitos. É a chave de deduplicação.
    #[schema(example = "12345678000190")]
    pub cnpj: String,

    #[schema(example = "Alimentício")]
    pub segment: String,
    #[schema(example = "Pão Quente Comércio de Alimentos Ltda")]
    pub company_name: Option<String>,
    #[schema(example = "5511999998888")]
    pub whatsapp: Option<String>,
    pub recurring: bool,
    #[schema(example = "indicação")]
    pub origin: String,

    // Geradas pelo outbox a partir do histórico de negociações
    #[schema(example = json!(["alimenticio", "cliente-ativo"]))]
    pub tags: Vec<String>,

    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Campos do cliente que chegam junto com o formulário da cotação.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInput {
    pub name: String,
    pub cnpj: String,
    pub segment: String,
    pub company_name: Option<String>,
    pub whatsapp: Option<String>,
    pub origin: String,
}

/// Filtros da listagem de clientes e das ações em lote (`filtros`).
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientFilter {
    /// Nome, razão social ou CNPJ (trecho, sem diferenciar maiúsculas)
    pub search: Option<String>,
    pub segment: Option<String>,
    pub recurring: Option<bool>,
    pub origin: Option<String>,
    /// Só para administradores. Vendedores sempre veem os próprios clientes.
    pub created_by: Option<Uuid>,
}

impl ClientFilter {
    pub fn scoped(mut self, principal: &Principal) -> Self {
        if !principal.is_admin() {
            self.created_by = Some(principal.id);
        }
        self
    }

    /// Espera o alias `c` e uma cláusula WHERE já aberta.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            qb.push(" AND (c.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.company_name ILIKE ")
                .push_bind(pattern);

            // Sem dígitos, o LIKE '%%' casaria com todo mundo
            let digits = normalize_cnpj(search);
            if !digits.is_empty() {
                qb.push(" OR c.cnpj LIKE ").push_bind(format!("%{}%", digits));
            }
            qb.push(")");
        }
        if let Some(segment) = self.segment.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND c.segment = ").push_bind(segment.trim().to_string());
        }
        if let Some(recurring) = self.recurring {
            qb.push(" AND c.recurring = ").push_bind(recurring);
        }
        if let Some(origin) = self.origin.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND c.origin = ").push_bind(origin.trim().to_string());
        }
        if let Some(created_by) = self.created_by {
            qb.push(" AND c.created_by_id = ").push_bind(created_by);
        }
    }
}

// Números usados para gerar as etiquetas do cliente
#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDealStats {
    pub pending: i64,
    pub sales: i64,
    pub lost: i64,
    pub sales_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub stats: ClientDealStats,
}

/// Remove a pontuação do CNPJ: "12.345.678/0001-90" -> "12345678000190".
pub fn normalize_cnpj(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cnpj_is_reduced_to_digits() {
        assert_eq!(normalize_cnpj("12.345.678/0001-90"), "12345678000190");
        assert_eq!(normalize_cnpj("12345678000190"), "12345678000190");
        assert_eq!(normalize_cnpj(" 12 345 "), "12345");
    }

    #[test]
    fn sellers_only_see_their_clients() {
        use crate::models::auth::UserRole;

        let seller = Principal { id: Uuid::new_v4(), name: "Bia".to_string(), role: UserRole::Vendedor };
        let filter = ClientFilter { created_by: Some(Uuid::new_v4()), ..Default::default() }.scoped(&seller);
        assert_eq!(filter.created_by, Some(seller.id));

        let mut qb = QueryBuilder::<Postgres>::new("SELECT c.id FROM clients c WHERE TRUE");
        filter.push_conditions(&mut qb);
        assert!(qb.sql().ends_with("c.created_by_id = $1"));
    }

    #[test]
    fn search_matches_name_company_and_cnpj() {
        let filter = ClientFilter { search: Some("12.345".to_string()), ..Default::default() };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT c.id FROM clients c WHERE TRUE");
        filter.push_conditions(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("c.name ILIKE $1"));
        assert!(sql.contains("c.company_name ILIKE $2"));
        assert!(sql.contains("c.cnpj LIKE $3"));
    }

    #[test]
    fn name_search_does_not_match_every_cnpj() {
        let filter = ClientFilter { search: Some("Padaria".to_string()), ..Default::default() };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT c.id FROM clients c WHERE TRUE");
        filter.push_conditions(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("c.company_name ILIKE $2)"));
        assert!(!sql.contains("c.cnpj"));
    }
}
