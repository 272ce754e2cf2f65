// src/models/deal.rs

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{
    auth::Principal,
    client::{normalize_cnpj, Client, ClientInput},
};

// --- ENUMS ---

// Mapeia o CREATE TYPE deal_status do banco.
// Cotação, venda e não-venda são a mesma linha em estados diferentes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deal_status")]
pub enum DealStatus {
    #[sqlx(rename = "pendente")]
    #[serde(rename = "pendente")]
    Pending,
    #[sqlx(rename = "finalizada")]
    #[serde(rename = "finalizada")]
    Finalized,
    #[sqlx(rename = "cancelada")]
    #[serde(rename = "cancelada")]
    Cancelled,
}

/// O que a conversão precisa fazer para ir de um status a outro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Mesmo status: atualiza a linha e substitui os itens
    Edit,
    /// pendente -> finalizada
    Close,
    /// pendente -> cancelada
    Lose,
    /// finalizada -> cancelada (desfaz a venda)
    ReverseSale,
    /// cancelada -> finalizada (recupera a não-venda)
    RecoverLost,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Pending => "pendente",
            DealStatus::Finalized => "finalizada",
            DealStatus::Cancelled => "cancelada",
        }
    }

    pub fn not_found_message(&self) -> &'static str {
        match self {
            DealStatus::Pending => "Cotação não encontrada",
            DealStatus::Finalized => "Venda não encontrada",
            DealStatus::Cancelled => "Não-venda não encontrada",
        }
    }

    /// Tabela de transições. Voltar para `pendente` depois de fechada não existe.
    pub fn transition_to(self, target: DealStatus) -> Option<Transition> {
        use DealStatus::*;
        match (self, target) {
            (from, to) if from == to => Some(Transition::Edit),
            (Pending, Finalized) => Some(Transition::Close),
            (Pending, Cancelled) => Some(Transition::Lose),
            (Finalized, Cancelled) => Some(Transition::ReverseSale),
            (Cancelled, Finalized) => Some(Transition::RecoverLost),
            (Finalized, Pending) | (Cancelled, Pending) => None,
            _ => None,
        }
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Transition {
    /// Edição e saída de `pendente` exigem o formulário completo.
    /// As reversões podem vir só com o novo status.
    pub fn requires_data(&self) -> bool {
        matches!(self, Transition::Edit | Transition::Close | Transition::Lose)
    }

    pub fn closes_deal(&self) -> bool {
        !matches!(self, Transition::Edit)
    }
}

// --- LINHAS DO BANCO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: Uuid,
    #[schema(example = "COT-20250301143000123")]
    pub code: String,
    pub status: DealStatus,
    #[schema(example = "50.00")]
    pub total_value: Decimal,
    #[schema(example = "30/60 dias")]
    pub payment_terms: String,
    pub recurring_sale: bool,
    pub recurrence_name: Option<String>,
    pub general_objection: Option<String>,
    pub client_id: Uuid,
    pub seller_id: Uuid,
    pub edited_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

// Snapshot do produto no momento da cotação, já com o nome do produto (JOIN)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealItem {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub unit: String,
    pub commission: Decimal,
    pub icms: Decimal,
    pub ipi: Decimal,
    pub competitor_price: Option<Decimal>,
    pub competitor_name: Option<String>,
    pub competitor_icms: Option<Decimal>,
    pub competitor_ipi: Option<Decimal>,
    pub objection: Option<String>,
    pub info_unavailable: bool,
    pub position: i32,
}

// Linha da listagem (cotações, vendas ou não-vendas)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealListEntry {
    pub id: Uuid,
    pub code: String,
    pub status: DealStatus,
    pub total_value: Decimal,
    pub payment_terms: String,
    pub recurring_sale: bool,
    pub general_objection: Option<String>,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_cnpj: String,
    pub segment: String,
    pub seller_id: Uuid,
    pub seller_name: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Tudo o que é preciso para remontar o formulário de uma negociação.
#[derive(Debug, Clone)]
pub struct DealDetail {
    pub deal: Deal,
    pub client: Client,
    pub seller_name: String,
    pub items: Vec<DealItem>,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealItemPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Produto X")]
    pub product_name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "cx")]
    pub unit: String,

    #[schema(example = "10")]
    pub quantity: Decimal,
    #[schema(example = "5.00")]
    pub price: Decimal,

    // Quando não vêm no formulário, valem 0
    pub commission: Option<Decimal>,
    pub icms: Option<Decimal>,
    pub ipi: Option<Decimal>,

    // Comparação com a concorrência (não-venda)
    pub competitor_price: Option<Decimal>,
    pub competitor_name: Option<String>,
    pub competitor_icms: Option<Decimal>,
    pub competitor_ipi: Option<Decimal>,
    pub objection: Option<String>,
    #[serde(default)]
    pub info_unavailable: bool,
}

/// Item já com os valores padrão aplicados, pronto para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot {
    pub product_name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub icms: Decimal,
    pub ipi: Decimal,
    pub competitor_price: Option<Decimal>,
    pub competitor_name: Option<String>,
    pub competitor_icms: Option<Decimal>,
    pub competitor_ipi: Option<Decimal>,
    pub objection: Option<String>,
    pub info_unavailable: bool,
}

impl DealItemPayload {
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            product_name: self.product_name.trim().to_string(),
            unit: self.unit.clone(),
            quantity: self.quantity,
            price: self.price,
            commission: self.commission.unwrap_or(Decimal::ZERO),
            icms: self.icms.unwrap_or(Decimal::ZERO),
            ipi: self.ipi.unwrap_or(Decimal::ZERO),
            competitor_price: self.competitor_price,
            competitor_name: self.competitor_name.clone(),
            competitor_icms: self.competitor_icms,
            competitor_ipi: self.competitor_ipi,
            objection: self.objection.clone(),
            info_unavailable: self.info_unavailable,
        }
    }
}

impl From<&DealItem> for ItemSnapshot {
    fn from(item: &DealItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            price: item.price,
            commission: item.commission,
            icms: item.icms,
            ipi: item.ipi,
            competitor_price: item.competitor_price,
            competitor_name: item.competitor_name.clone(),
            competitor_icms: item.competitor_icms,
            competitor_ipi: item.competitor_ipi,
            objection: item.objection.clone(),
            info_unavailable: item.info_unavailable,
        }
    }
}

/// O formulário da negociação: serve para criar, editar, converter e também
/// é o formato devolvido na leitura individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Padaria Pão Quente")]
    pub client_name: String,

    #[validate(length(min = 14, max = 18, message = "invalid_cnpj"))]
    #[schema(example = "12.345.678/0001-90")]
    pub cnpj: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Alimentício")]
    pub segment: String,

    pub company_name: Option<String>,
    #[schema(example = "(11) 99999-8888")]
    pub whatsapp: Option<String>,
    #[schema(example = "indicação")]
    pub origin: Option<String>,

    /// Código escolhido pelo vendedor. Sem ele o código é gerado.
    #[schema(example = "COT-2025-001")]
    pub manual_code: Option<String>,

    /// Sem valor explícito vale a soma de quantidade × valor dos itens.
    #[schema(example = "50.00")]
    pub total_value: Option<Decimal>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "30/60 dias")]
    pub payment_terms: String,

    #[serde(default)]
    pub recurring_sale: bool,
    pub recurrence_name: Option<String>,

    /// Objeção geral (não-venda)
    pub general_objection: Option<String>,

    #[validate(length(min = 1, message = "at_least_one_item"))]
    #[validate(nested)]
    pub items: Vec<DealItemPayload>,
}

impl DealPayload {
    pub fn client_input(&self) -> ClientInput {
        ClientInput {
            name: self.client_name.trim().to_string(),
            cnpj: normalize_cnpj(&self.cnpj),
            segment: self.segment.trim().to_string(),
            company_name: self.company_name.clone(),
            whatsapp: self.whatsapp.clone().filter(|w| !w.trim().is_empty()),
            origin: self.origin.clone().unwrap_or_else(|| "manual".to_string()),
        }
    }

    pub fn item_snapshots(&self) -> Vec<ItemSnapshot> {
        self.items.iter().map(DealItemPayload::snapshot).collect()
    }

    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|i| i.quantity * i.price).sum()
    }

    pub fn resolved_total(&self) -> Decimal {
        self.total_value.unwrap_or_else(|| self.items_total())
    }

    pub fn manual_code(&self) -> Option<&str> {
        self.manual_code.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Regras que o `validator` não cobre (valores decimais e CNPJ).
    pub fn check_values(&self) -> Result<(), String> {
        if normalize_cnpj(&self.cnpj).len() != 14 {
            return Err("CNPJ deve ter 14 dígitos.".to_string());
        }
        if let Some(total) = self.total_value {
            if total < Decimal::ZERO {
                return Err("O valor total não pode ser negativo.".to_string());
            }
        }
        for item in &self.items {
            if item.quantity <= Decimal::ZERO {
                return Err(format!("Quantidade inválida para o produto '{}'.", item.product_name));
            }
            if item.price < Decimal::ZERO {
                return Err(format!("Valor inválido para o produto '{}'.", item.product_name));
            }
        }
        Ok(())
    }

    /// O formulário como ele fica depois de gravado: padrões aplicados.
    pub fn with_defaults(&self) -> DealPayload {
        let mut out = self.clone();
        out.total_value = Some(self.resolved_total());
        out.origin = Some(self.client_input().origin);
        out.items = self
            .items
            .iter()
            .map(|i| DealItemPayload {
                commission: Some(i.commission.unwrap_or(Decimal::ZERO)),
                icms: Some(i.icms.unwrap_or(Decimal::ZERO)),
                ipi: Some(i.ipi.unwrap_or(Decimal::ZERO)),
                ..i.clone()
            })
            .collect();
        out
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertDealPayload {
    #[schema(example = "finalizada")]
    pub new_status: DealStatus,
    pub data: Option<DealPayload>,
    /// Objeção usada ao desfazer uma venda sem reenviar o formulário
    pub objection: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertDealResponse {
    pub success: bool,
    pub id: Uuid,
    pub status: DealStatus,
}

/// Leitura individual: metadados + o formulário remontado.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealView {
    pub id: Uuid,
    pub code: String,
    pub status: DealStatus,
    pub client_id: Uuid,
    pub seller_id: Uuid,
    pub seller_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub form: DealPayload,
}

impl DealDetail {
    pub fn into_view(self) -> DealView {
        let DealDetail { deal, client, seller_name, mut items } = self;
        items.sort_by_key(|i| i.position);

        let form = DealPayload {
            client_name: client.name,
            cnpj: client.cnpj,
            segment: client.segment,
            company_name: client.company_name,
            whatsapp: client.whatsapp,
            origin: Some(client.origin),
            manual_code: Some(deal.code.clone()),
            total_value: Some(deal.total_value),
            payment_terms: deal.payment_terms,
            recurring_sale: deal.recurring_sale,
            recurrence_name: deal.recurrence_name,
            general_objection: deal.general_objection,
            items: items
                .into_iter()
                .map(|i| DealItemPayload {
                    product_name: i.product_name,
                    unit: i.unit,
                    quantity: i.quantity,
                    price: i.price,
                    commission: Some(i.commission),
                    icms: Some(i.icms),
                    ipi: Some(i.ipi),
                    competitor_price: i.competitor_price,
                    competitor_name: i.competitor_name,
                    competitor_icms: i.competitor_icms,
                    competitor_ipi: i.competitor_ipi,
                    objection: i.objection,
                    info_unavailable: i.info_unavailable,
                })
                .collect(),
        };

        DealView {
            id: deal.id,
            code: deal.code,
            status: deal.status,
            client_id: deal.client_id,
            seller_id: deal.seller_id,
            seller_name,
            created_at: deal.created_at,
            updated_at: deal.updated_at,
            closed_at: deal.closed_at,
            form,
        }
    }
}

// --- FILTROS ---

/// Filtros da listagem. Cada campo vira exatamente uma condição SQL.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DealFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Trecho do nome do cliente (sem diferenciar maiúsculas)
    pub client_name: Option<String>,
    pub segment: Option<String>,
    pub recurring: Option<bool>,
    pub min_value: Option<Decimal>,
    pub max_value: Option<Decimal>,
    /// Só respeitado para administradores
    pub seller: Option<Uuid>,
    /// Trecho do nome de um produto
    pub product: Option<String>,
    /// Lista de produtos separados por vírgula (qualquer um deles)
    pub products: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl DealFilter {
    /// Vendedor só enxerga as próprias negociações, seja qual for o filtro enviado.
    pub fn scoped(mut self, principal: &Principal) -> Self {
        if !principal.is_admin() {
            self.seller = Some(principal.id);
        }
        self
    }

    pub fn product_list(&self) -> Vec<String> {
        self.products
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Acrescenta as condições à query. Espera os aliases `d` (deals) e `c` (clients)
    /// e uma cláusula WHERE já aberta.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(start) = self.start_date {
            qb.push(" AND d.created_at::date >= ").push_bind(start);
        }
        if let Some(end) = self.end_date {
            qb.push(" AND d.created_at::date <= ").push_bind(end);
        }
        if let Some(name) = non_blank(&self.client_name) {
            qb.push(" AND c.name ILIKE ").push_bind(format!("%{}%", name));
        }
        if let Some(segment) = non_blank(&self.segment) {
            qb.push(" AND c.segment = ").push_bind(segment);
        }
        if let Some(recurring) = self.recurring {
            qb.push(" AND d.recurring_sale = ").push_bind(recurring);
        }
        if let Some(min) = self.min_value {
            qb.push(" AND d.total_value >= ").push_bind(min);
        }
        if let Some(max) = self.max_value {
            qb.push(" AND d.total_value <= ").push_bind(max);
        }
        if let Some(seller) = self.seller {
            qb.push(" AND d.seller_id = ").push_bind(seller);
        }

        let products = self.product_list();
        if !products.is_empty() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM deal_items di JOIN products p ON p.id = di.product_id \
                 WHERE di.deal_id = d.id AND p.name = ANY(",
            )
            .push_bind(products)
            .push("))");
        } else if let Some(product) = non_blank(&self.product) {
            qb.push(
                " AND EXISTS (SELECT 1 FROM deal_items di JOIN products p ON p.id = di.product_id \
                 WHERE di.deal_id = d.id AND p.name ILIKE ",
            )
            .push_bind(format!("%{}%", product))
            .push(")");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(v: f64) -> Decimal {
        Decimal::from_f64(v).unwrap().round_dp(2)
    }

    fn item(name: &str, qty: i64, price: f64) -> DealItemPayload {
        DealItemPayload {
            product_name: name.to_string(),
            unit: "cx".to_string(),
            quantity: Decimal::from(qty),
            price: dec(price),
            commission: None,
            icms: None,
            ipi: None,
            competitor_price: None,
            competitor_name: None,
            competitor_icms: None,
            competitor_ipi: None,
            objection: None,
            info_unavailable: false,
        }
    }

    fn payload() -> DealPayload {
        DealPayload {
            client_name: "Padaria Pão Quente".to_string(),
            cnpj: "12.345.678/0001-90".to_string(),
            segment: "Alimentício".to_string(),
            company_name: None,
            whatsapp: Some("(11) 99999-8888".to_string()),
            origin: None,
            manual_code: None,
            total_value: None,
            payment_terms: "30/60 dias".to_string(),
            recurring_sale: false,
            recurrence_name: None,
            general_objection: None,
            items: vec![item("Produto X", 10, 5.0)],
        }
    }

    fn principal(role: UserRole) -> Principal {
        Principal { id: Uuid::new_v4(), name: "Ana".to_string(), role }
    }

    // Simula o que o repositório grava e devolve para um formulário.
    fn stored(form: &DealPayload, code: &str) -> DealDetail {
        let now = Utc::now();
        let seller = Uuid::new_v4();
        let input = form.client_input();
        let client = Client {
            id: Uuid::new_v4(),
            name: input.name,
            cnpj: input.cnpj,
            segment: input.segment,
            company_name: input.company_name,
            whatsapp: input.whatsapp,
            recurring: form.recurring_sale,
            origin: input.origin,
            tags: vec![],
            created_by_id: seller,
            created_at: now,
            updated_at: now,
        };
        let deal = Deal {
            id: Uuid::new_v4(),
            code: code.to_string(),
            status: DealStatus::Pending,
            total_value: form.resolved_total(),
            payment_terms: form.payment_terms.clone(),
            recurring_sale: form.recurring_sale,
            recurrence_name: form.recurrence_name.clone(),
            general_objection: form.general_objection.clone(),
            client_id: client.id,
            seller_id: seller,
            edited_by_id: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };
        // Gravados fora de ordem de propósito: a leitura ordena por posição.
        let mut items: Vec<DealItem> = form
            .item_snapshots()
            .into_iter()
            .enumerate()
            .map(|(pos, s)| DealItem {
                id: Uuid::new_v4(),
                deal_id: deal.id,
                product_id: Uuid::new_v4(),
                product_name: s.product_name,
                quantity: s.quantity,
                price: s.price,
                unit: s.unit,
                commission: s.commission,
                icms: s.icms,
                ipi: s.ipi,
                competitor_price: s.competitor_price,
                competitor_name: s.competitor_name,
                competitor_icms: s.competitor_icms,
                competitor_ipi: s.competitor_ipi,
                objection: s.objection,
                info_unavailable: s.info_unavailable,
                position: pos as i32,
            })
            .collect();
        items.reverse();
        DealDetail { deal, client, seller_name: "Ana".to_string(), items }
    }

    #[test]
    fn transition_table() {
        use DealStatus::*;
        assert_eq!(Pending.transition_to(Pending), Some(Transition::Edit));
        assert_eq!(Pending.transition_to(Finalized), Some(Transition::Close));
        assert_eq!(Pending.transition_to(Cancelled), Some(Transition::Lose));
        assert_eq!(Finalized.transition_to(Cancelled), Some(Transition::ReverseSale));
        assert_eq!(Cancelled.transition_to(Finalized), Some(Transition::RecoverLost));
        assert_eq!(Finalized.transition_to(Finalized), Some(Transition::Edit));
        assert_eq!(Finalized.transition_to(Pending), None);
        assert_eq!(Cancelled.transition_to(Pending), None);
    }

    #[test]
    fn reversals_do_not_require_the_form() {
        assert!(Transition::Close.requires_data());
        assert!(Transition::Lose.requires_data());
        assert!(Transition::Edit.requires_data());
        assert!(!Transition::ReverseSale.requires_data());
        assert!(!Transition::RecoverLost.requires_data());
        assert!(!Transition::Edit.closes_deal());
        assert!(Transition::Lose.closes_deal());
    }

    #[test]
    fn status_uses_portuguese_wire_names() {
        assert_eq!(serde_json::to_string(&DealStatus::Cancelled).unwrap(), "\"cancelada\"");
        let parsed: DealStatus = serde_json::from_str("\"finalizada\"").unwrap();
        assert_eq!(parsed, DealStatus::Finalized);
        assert!(serde_json::from_str::<DealStatus>("\"aberta\"").is_err());
    }

    #[test]
    fn missing_taxes_default_to_zero() {
        let snapshot = item("Produto X", 10, 5.0).snapshot();
        assert_eq!(snapshot.commission, Decimal::ZERO);
        assert_eq!(snapshot.icms, Decimal::ZERO);
        assert_eq!(snapshot.ipi, Decimal::ZERO);
    }

    #[test]
    fn total_defaults_to_item_sum() {
        let mut form = payload();
        form.items.push(item("Produto Y", 2, 7.5));
        assert_eq!(form.resolved_total(), dec(65.0));

        form.total_value = Some(dec(60.0));
        assert_eq!(form.resolved_total(), dec(60.0));
    }

    #[test]
    fn create_then_read_returns_the_form_with_defaults() {
        let mut form = payload();
        form.items.push(DealItemPayload { icms: Some(dec(18.0)), ..item("Produto Y", 1, 3.0) });

        let view = stored(&form, "COT-1").into_view();

        let mut expected = form.with_defaults();
        expected.manual_code = Some("COT-1".to_string());
        // O CNPJ volta como foi gravado (só dígitos)
        expected.cnpj = "12345678000190".to_string();
        assert_eq!(view.form, expected);
        assert_eq!(view.form.items[0].product_name, "Produto X");
        assert_eq!(view.form.items[1].icms, Some(dec(18.0)));
    }

    #[test]
    fn check_values_rejects_bad_numbers() {
        let mut form = payload();
        assert!(form.check_values().is_ok());

        form.items[0].quantity = Decimal::ZERO;
        assert!(form.check_values().is_err());

        let mut form = payload();
        form.cnpj = "123".to_string();
        assert!(form.check_values().is_err());
    }

    #[test]
    fn blank_manual_code_is_ignored() {
        let mut form = payload();
        form.manual_code = Some("   ".to_string());
        assert_eq!(form.manual_code(), None);
        form.manual_code = Some(" COT-9 ".to_string());
        assert_eq!(form.manual_code(), Some("COT-9"));
    }

    #[test]
    fn seller_filter_is_forced_for_non_admins() {
        let seller = principal(UserRole::Vendedor);
        let other = Uuid::new_v4();

        let scoped = DealFilter { seller: Some(other), ..Default::default() }.scoped(&seller);
        assert_eq!(scoped.seller, Some(seller.id));

        let scoped = DealFilter::default().scoped(&seller);
        assert_eq!(scoped.seller, Some(seller.id));
    }

    #[test]
    fn admins_keep_the_requested_seller() {
        let admin = principal(UserRole::Admin);
        let other = Uuid::new_v4();

        let scoped = DealFilter { seller: Some(other), ..Default::default() }.scoped(&admin);
        assert_eq!(scoped.seller, Some(other));
        assert_eq!(DealFilter::default().scoped(&admin).seller, None);
    }

    #[test]
    fn filter_maps_each_field_to_one_condition() {
        let filter = DealFilter {
            client_name: Some("pão".to_string()),
            segment: Some("  ".to_string()),
            min_value: Some(dec(10.0)),
            seller: Some(Uuid::new_v4()),
            product: Some("X".to_string()),
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new("SELECT d.id FROM deals d JOIN clients c ON c.id = d.client_id WHERE d.status = ");
        qb.push_bind(DealStatus::Pending);
        filter.push_conditions(&mut qb);
        let sql = qb.sql();

        assert!(sql.contains("c.name ILIKE $2"));
        assert!(sql.contains("d.total_value >= $3"));
        assert!(sql.contains("d.seller_id = $4"));
        assert!(sql.contains("p.name ILIKE $5"));
        assert!(!sql.contains("c.segment"));
    }

    #[test]
    fn product_list_wins_over_single_product() {
        let filter = DealFilter {
            product: Some("X".to_string()),
            products: Some("Produto X, Produto Y,,".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.product_list(), vec!["Produto X", "Produto Y"]);

        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM deals d WHERE TRUE");
        filter.push_conditions(&mut qb);
        assert!(qb.sql().contains("p.name = ANY($1)"));
        assert!(!qb.sql().contains("ILIKE"));
    }
}
