// src/services/deal_service.rs

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{
        deal_repo::DealFields, ClientRepository, DealRepository, EventRepository,
        ProductRepository, SettingsRepository,
    },
    models::{
        auth::Principal,
        client::Client,
        deal::{
            ConvertDealPayload, ConvertDealResponse, Deal, DealDetail, DealFilter, DealListEntry,
            DealPayload, DealStatus, DealView, ItemSnapshot, Transition,
        },
        event::DealEventKind,
    },
};

/// Código gerado quando o vendedor não informa um: "COT-20250301143000123".
pub fn default_deal_code(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, now.format("%Y%m%d%H%M%S%3f"))
}

// Vendedor só enxerga as próprias negociações. Para os outros, a negociação "não existe".
fn ensure_visible(deal: &Deal, principal: &Principal, status: DealStatus) -> Result<(), AppError> {
    if deal.status != status || (!principal.is_admin() && deal.seller_id != principal.id) {
        return Err(AppError::NotFound(status.not_found_message().to_string()));
    }
    Ok(())
}

/// Só a edição troca o código. Fechar, perder ou reverter mantém o código da cotação.
fn resolve_code<'a>(current: &'a Deal, form: &'a DealPayload, transition: Transition) -> &'a str {
    match transition {
        Transition::Edit => form.manual_code().unwrap_or(current.code.as_str()),
        _ => current.code.as_str(),
    }
}

fn validate_form(form: &DealPayload) -> Result<(), AppError> {
    form.validate()?;
    form.check_values().map_err(AppError::BadRequest)
}

/// Erros de negócio chegam ao cliente como estão. O resto vira a falha genérica
/// de conversão, com a causa só no log.
fn wrap_conversion_error(err: AppError) -> AppError {
    match err {
        AppError::DuplicateCode(_)
        | AppError::BadRequest(_)
        | AppError::ValidationError(_)
        | AppError::NotFound(_)
        | AppError::InvalidTransition { .. }
        | AppError::ConversionFailed(_) => err,
        other => AppError::ConversionFailed(Box::new(other)),
    }
}

#[derive(Clone)]
pub struct DealService {
    pool: PgPool,
    deal_repo: DealRepository,
    client_repo: ClientRepository,
    product_repo: ProductRepository,
    settings_repo: SettingsRepository,
    event_repo: EventRepository,
}

impl DealService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            deal_repo: DealRepository::new(),
            client_repo: ClientRepository::new(),
            product_repo: ProductRepository::new(),
            settings_repo: SettingsRepository::new(),
            event_repo: EventRepository::new(),
        }
    }

    // --- CRIAR COTAÇÃO ---
    pub async fn create_quote(&self, principal: &Principal, form: DealPayload) -> Result<Deal, AppError> {
        validate_form(&form)?;

        let mut tx = self.pool.begin().await?;

        // 1. Resolve o código antes de qualquer escrita
        let code = match form.manual_code() {
            Some(code) => code.to_string(),
            None => {
                let settings = self.settings_repo.get_settings(&mut *tx).await?;
                default_deal_code(&settings.code_prefix, Utc::now())
            }
        };
        if self.deal_repo.code_exists(&mut *tx, &code, None).await? {
            return Err(AppError::DuplicateCode(code));
        }

        // 2. Cliente (por CNPJ)
        let client = self.client_repo
            .upsert_by_cnpj(&mut *tx, &form.client_input(), form.recurring_sale, principal.id)
            .await?;

        // 3. A negociação nasce pendente
        let fields = DealFields {
            code: &code,
            status: DealStatus::Pending,
            total_value: form.resolved_total(),
            payment_terms: &form.payment_terms,
            recurring_sale: form.recurring_sale,
            recurrence_name: form.recurrence_name.as_deref(),
            general_objection: form.general_objection.as_deref(),
            client_id: client.id,
        };
        let deal = self.deal_repo.create_deal(&mut *tx, &fields, principal.id).await?;

        // 4. Itens + efeitos colaterais
        self.write_items(&mut *tx, deal.id, &form.item_snapshots(), principal.id).await?;
        self.enqueue_side_effects(&mut *tx, &client, deal.id, true).await?;

        tx.commit().await?;

        tracing::info!("📝 Cotação {} criada por {}", deal.code, principal.name);
        Ok(deal)
    }

    // --- ATUALIZAR COTAÇÃO ---
    pub async fn update_quote(
        &self,
        principal: &Principal,
        id: Uuid,
        form: DealPayload,
    ) -> Result<Deal, AppError> {
        validate_form(&form)?;

        let mut tx = self.pool.begin().await?;

        let current = self.deal_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(DealStatus::Pending.not_found_message().to_string()))?;
        ensure_visible(&current, principal, DealStatus::Pending)?;

        let (deal, client) = self
            .apply_form(&mut *tx, &current, Transition::Edit, DealStatus::Pending, &form, None, principal)
            .await?;
        self.enqueue_side_effects(&mut *tx, &client, deal.id, false).await?;

        tx.commit().await?;
        Ok(deal)
    }

    // --- LEITURA INDIVIDUAL (cotação, venda ou não-venda) ---
    pub async fn get_deal(
        &self,
        principal: &Principal,
        id: Uuid,
        status: DealStatus,
    ) -> Result<DealView, AppError> {
        let mut conn = self.pool.acquire().await?;

        let deal = self.deal_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(status.not_found_message().to_string()))?;
        ensure_visible(&deal, principal, status)?;

        let client = self.client_repo
            .find_by_id(&mut *conn, deal.client_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Cliente {} da negociação {} sumiu", deal.client_id, deal.id))?;
        let seller_name = self.deal_repo.seller_name(&mut *conn, deal.seller_id).await?;
        let items = self.deal_repo.list_items(&mut *conn, deal.id).await?;

        Ok(DealDetail { deal, client, seller_name, items }.into_view())
    }

    pub async fn list_deals(
        &self,
        principal: &Principal,
        status: DealStatus,
        filter: DealFilter,
    ) -> Result<Vec<DealListEntry>, AppError> {
        let filter = filter.scoped(principal);
        self.deal_repo.list_deals(&self.pool, status, &filter).await
    }

    // --- EXCLUIR COTAÇÃO ---
    pub async fn delete_quote(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        let seller = (!principal.is_admin()).then_some(principal.id);
        let removed = self.deal_repo
            .delete_deal(&self.pool, id, DealStatus::Pending, seller)
            .await?;

        if removed > 0 {
            tracing::info!("🗑️ Cotação {} excluída por {}", id, principal.name);
        }
        Ok(())
    }

    // --- CONVERSÃO DE STATUS ---
    pub async fn convert(
        &self,
        principal: &Principal,
        id: Uuid,
        payload: ConvertDealPayload,
    ) -> Result<ConvertDealResponse, AppError> {
        let target = payload.new_status;

        let mut tx = self.pool.begin().await?;

        // A trava serializa conversões concorrentes da mesma negociação
        let current = self.deal_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Negociação não encontrada".to_string()))?;
        ensure_visible(&current, principal, current.status)?;

        let transition = current
            .status
            .transition_to(target)
            .ok_or(AppError::InvalidTransition { from: current.status, to: target })?;

        if transition.requires_data() && payload.data.is_none() {
            return Err(AppError::BadRequest(
                "Os dados da negociação são obrigatórios para esta conversão.".to_string(),
            ));
        }
        if let Some(form) = &payload.data {
            validate_form(form)?;
        }

        let closed_at = if transition.closes_deal() {
            Some(Utc::now())
        } else {
            current.closed_at
        };

        let result = match &payload.data {
            Some(form) => self
                .apply_form(&mut *tx, &current, transition, target, form, closed_at, principal)
                .await
                .map(|(deal, _)| deal),
            None => self
                .flip_status(&mut *tx, &current, transition, payload.objection.as_deref(), closed_at, principal)
                .await,
        };
        let deal = result.map_err(wrap_conversion_error)?;

        if transition.closes_deal() {
            self.event_repo
                .enqueue(&mut *tx, DealEventKind::GenerateTags, deal.client_id, Some(deal.id))
                .await
                .map_err(wrap_conversion_error)?;
        }

        tx.commit()
            .await
            .map_err(|e| wrap_conversion_error(e.into()))?;

        tracing::info!(
            "🔁 Negociação {} convertida: {} → {} ({:?})",
            deal.code, current.status, deal.status, transition
        );

        Ok(ConvertDealResponse { success: true, id: deal.id, status: deal.status })
    }

    // =========================================================================
    //  INTERNOS (sempre dentro da transação de quem chama)
    // =========================================================================

    /// Grava o formulário inteiro sobre a linha existente: cliente, valores e a
    /// troca completa dos itens. O código só muda na edição.
    async fn apply_form(
        &self,
        conn: &mut PgConnection,
        current: &Deal,
        transition: Transition,
        status: DealStatus,
        form: &DealPayload,
        closed_at: Option<DateTime<Utc>>,
        principal: &Principal,
    ) -> Result<(Deal, Client), AppError> {
        let code = resolve_code(current, form, transition).to_string();
        if code != current.code && self.deal_repo.code_exists(&mut *conn, &code, Some(current.id)).await? {
            return Err(AppError::DuplicateCode(code));
        }

        let client = self.client_repo
            .upsert_by_cnpj(&mut *conn, &form.client_input(), form.recurring_sale, principal.id)
            .await?;

        let fields = DealFields {
            code: &code,
            status,
            total_value: form.resolved_total(),
            payment_terms: &form.payment_terms,
            recurring_sale: form.recurring_sale,
            recurrence_name: form.recurrence_name.as_deref(),
            general_objection: form.general_objection.as_deref(),
            client_id: client.id,
        };
        let deal = self.deal_repo
            .update_deal(&mut *conn, current.id, &fields, closed_at, principal.id)
            .await?;

        self.deal_repo.delete_items(&mut *conn, current.id).await?;
        self.write_items(conn, current.id, &form.item_snapshots(), principal.id).await?;

        Ok((deal, client))
    }

    /// Reversões sem formulário: só o status (e a objeção) mudam, os itens ficam todos.
    async fn flip_status(
        &self,
        conn: &mut PgConnection,
        current: &Deal,
        transition: Transition,
        objection: Option<&str>,
        closed_at: Option<DateTime<Utc>>,
        principal: &Principal,
    ) -> Result<Deal, AppError> {
        let (status, general_objection) = match transition {
            Transition::ReverseSale => (
                DealStatus::Cancelled,
                objection.or(current.general_objection.as_deref()),
            ),
            // Uma venda não tem objeção
            Transition::RecoverLost => (DealStatus::Finalized, None),
            _ => (current.status, current.general_objection.as_deref()),
        };

        let fields = DealFields {
            code: &current.code,
            status,
            total_value: current.total_value,
            payment_terms: &current.payment_terms,
            recurring_sale: current.recurring_sale,
            recurrence_name: current.recurrence_name.as_deref(),
            general_objection,
            client_id: current.client_id,
        };

        self.deal_repo
            .update_deal(&mut *conn, current.id, &fields, closed_at, principal.id)
            .await
    }

    async fn write_items(
        &self,
        conn: &mut PgConnection,
        deal_id: Uuid,
        items: &[ItemSnapshot],
        created_by: Uuid,
    ) -> Result<(), AppError> {
        for (position, item) in items.iter().enumerate() {
            let product = self.product_repo.find_or_create(&mut *conn, item, created_by).await?;
            self.deal_repo
                .insert_item(&mut *conn, deal_id, product.id, position as i32, item)
                .await?;
        }
        Ok(())
    }

    async fn enqueue_side_effects(
        &self,
        conn: &mut PgConnection,
        client: &Client,
        deal_id: Uuid,
        sync_crm: bool,
    ) -> Result<(), AppError> {
        self.event_repo
            .enqueue(&mut *conn, DealEventKind::GenerateTags, client.id, Some(deal_id))
            .await?;

        if sync_crm && client.whatsapp.is_some() {
            self.event_repo
                .enqueue(&mut *conn, DealEventKind::SyncCrm, client.id, Some(deal_id))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use crate::db::UserRepository;
    use crate::models::deal::DealItemPayload;

    fn deal(status: DealStatus, seller_id: Uuid) -> Deal {
        let now = Utc::now();
        Deal {
            id: Uuid::new_v4(),
            code: "COT-1".to_string(),
            status,
            total_value: Decimal::from(50),
            payment_terms: "30 dias".to_string(),
            recurring_sale: false,
            recurrence_name: None,
            general_objection: None,
            client_id: Uuid::new_v4(),
            seller_id,
            edited_by_id: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    fn principal(role: UserRole) -> Principal {
        Principal { id: Uuid::new_v4(), name: "Caio".to_string(), role }
    }

    fn item(name: &str, quantity: Decimal, price: Decimal) -> DealItemPayload {
        DealItemPayload {
            product_name: name.to_string(),
            unit: "cx".to_string(),
            quantity,
            price,
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

    fn form(cnpj: &str, manual_code: Option<&str>) -> DealPayload {
        DealPayload {
            client_name: "Padaria Sol".to_string(),
            cnpj: cnpj.to_string(),
            segment: "Alimentício".to_string(),
            company_name: None,
            whatsapp: None,
            origin: None,
            manual_code: manual_code.map(str::to_string),
            total_value: None,
            payment_terms: "30 dias".to_string(),
            recurring_sale: false,
            recurrence_name: None,
            general_objection: None,
            items: vec![item("Farinha", Decimal::from(10), Decimal::new(5125, 3))],
        }
    }

    async fn seller(pool: &PgPool, email: &str, role: UserRole) -> Principal {
        let user = UserRepository::new(pool.clone())
            .create_user(pool, "Caio", email, "hash", role)
            .await
            .unwrap();
        Principal { id: user.id, name: user.name, role: user.role }
    }

    async fn move_to(
        service: &DealService,
        principal: &Principal,
        id: Uuid,
        new_status: DealStatus,
        data: Option<DealPayload>,
        objection: Option<String>,
    ) -> Result<ConvertDealResponse, AppError> {
        service.convert(principal, id, ConvertDealPayload { new_status, data, objection }).await
    }

    async fn count(pool: &PgPool, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
    }

    #[test]
    fn only_edits_change_the_code() {
        let current = deal(DealStatus::Pending, Uuid::new_v4());
        let with_code = form("12345678000190", Some("OUTRO"));

        assert_eq!(resolve_code(&current, &with_code, Transition::Edit), "OUTRO");
        assert_eq!(resolve_code(&current, &form("12345678000190", None), Transition::Edit), "COT-1");
        for transition in [
            Transition::Close,
            Transition::Lose,
            Transition::ReverseSale,
            Transition::RecoverLost,
        ] {
            assert_eq!(resolve_code(&current, &with_code, transition), "COT-1");
        }
    }

    #[test]
    fn default_code_uses_prefix_and_millis() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 14, 30, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(default_deal_code("COT", at), "COT-20250301143000123");
        assert_eq!(default_deal_code("ORC", at), "ORC-20250301143000123");
    }

    #[test]
    fn quote_lookup_only_resolves_pending_rows() {
        let seller = principal(UserRole::Vendedor);
        let sale = deal(DealStatus::Finalized, seller.id);

        let err = ensure_visible(&sale, &seller, DealStatus::Pending).unwrap_err();
        assert_eq!(err.to_string(), "Cotação não encontrada");
        assert!(ensure_visible(&sale, &seller, DealStatus::Finalized).is_ok());
    }

    #[test]
    fn sellers_cannot_see_other_sellers_deals() {
        let seller = principal(UserRole::Vendedor);
        let admin = principal(UserRole::Admin);
        let other = deal(DealStatus::Cancelled, Uuid::new_v4());

        let err = ensure_visible(&other, &seller, DealStatus::Cancelled).unwrap_err();
        assert_eq!(err.to_string(), "Não-venda não encontrada");
        assert!(ensure_visible(&other, &admin, DealStatus::Cancelled).is_ok());
    }

    #[test]
    fn conversion_keeps_business_errors_and_hides_the_rest() {
        let dup = wrap_conversion_error(AppError::DuplicateCode("COT-1".to_string()));
        assert!(matches!(dup, AppError::DuplicateCode(_)));

        let db = wrap_conversion_error(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        assert!(matches!(db, AppError::ConversionFailed(_)));
        assert_eq!(db.to_string(), "Falha em todos os métodos de conversão.");
    }

    // =========================================================================
    //  COM BANCO
    // =========================================================================

    #[sqlx::test(migrations = "./migrations")]
    async fn created_quote_reads_back_as_the_submitted_form(pool: PgPool) {
        let admin = seller(&pool, "admin@empresa.com.br", UserRole::Admin).await;
        let service = DealService::new(pool.clone());
        let submitted = form("12345678000190", Some("COT-A"));

        let created = service.create_quote(&admin, submitted.clone()).await.unwrap();
        let view = service.get_deal(&admin, created.id, DealStatus::Pending).await.unwrap();

        assert_eq!(view.code, "COT-A");
        assert_eq!(view.seller_name, "Caio");
        assert_eq!(view.form, submitted.with_defaults());
        // Sem arredondamento: 10 × 5,125
        assert_eq!(view.form.items[0].price, Decimal::new(5125, 3));
        assert_eq!(view.form.total_value, Some(Decimal::new(5125, 2)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_manual_code_writes_nothing(pool: PgPool) {
        let admin = seller(&pool, "admin@empresa.com.br", UserRole::Admin).await;
        let service = DealService::new(pool.clone());
        service.create_quote(&admin, form("12345678000190", Some("COT-A"))).await.unwrap();

        let err = service
            .create_quote(&admin, form("98765432000110", Some("COT-A")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateCode(ref c) if c == "COT-A"));
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM deals").await, 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM clients").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn same_cnpj_and_product_name_reuse_rows(pool: PgPool) {
        let admin = seller(&pool, "admin@empresa.com.br", UserRole::Admin).await;
        let service = DealService::new(pool.clone());

        service.create_quote(&admin, form("12345678000190", None)).await.unwrap();
        service.create_quote(&admin, form("12.345.678/0001-90", Some("COT-B"))).await.unwrap();

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM deals").await, 2);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM clients").await, 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn losing_a_quote_keeps_its_code(pool: PgPool) {
        let admin = seller(&pool, "admin@empresa.com.br", UserRole::Admin).await;
        let service = DealService::new(pool.clone());
        let quote = service.create_quote(&admin, form("12345678000190", Some("COT-A"))).await.unwrap();

        let mut lost = form("12345678000190", Some("OUTRO"));
        lost.general_objection = Some("Preço".to_string());
        service
            .convert(&admin, quote.id, ConvertDealPayload {
                new_status: DealStatus::Cancelled,
                data: Some(lost),
                objection: None,
            })
            .await
            .unwrap();

        let view = service.get_deal(&admin, quote.id, DealStatus::Cancelled).await.unwrap();
        assert_eq!(view.code, "COT-A");
        assert_eq!(view.form.general_objection.as_deref(), Some("Preço"));
        assert!(matches!(
            service.get_deal(&admin, quote.id, DealStatus::Pending).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM deals").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn every_transition_moves_the_same_row(pool: PgPool) {
        let admin = seller(&pool, "admin@empresa.com.br", UserRole::Admin).await;
        let service = DealService::new(pool.clone());
        let quote = service.create_quote(&admin, form("12345678000190", Some("COT-A"))).await.unwrap();

        // Edição: pode trocar o código
        let edited = form("12345678000190", Some("COT-B"));
        move_to(&service, &admin, quote.id, DealStatus::Pending, Some(edited), None).await.unwrap();
        let view = service.get_deal(&admin, quote.id, DealStatus::Pending).await.unwrap();
        assert_eq!(view.code, "COT-B");
        assert!(view.closed_at.is_none());

        // Fechamento
        let closing = form("12345678000190", None);
        let response = move_to(&service, &admin, quote.id, DealStatus::Finalized, Some(closing), None)
            .await
            .unwrap();
        assert_eq!(response.status, DealStatus::Finalized);
        let sale = service.get_deal(&admin, quote.id, DealStatus::Finalized).await.unwrap();
        assert_eq!(sale.code, "COT-B");
        assert!(sale.closed_at.is_some());

        // Venda desfeita, sem formulário: itens ficam e a objeção é gravada
        move_to(&service, &admin, quote.id, DealStatus::Cancelled, None, Some("Prazo".to_string())).await.unwrap();
        let lost = service.get_deal(&admin, quote.id, DealStatus::Cancelled).await.unwrap();
        assert_eq!(lost.form.general_objection.as_deref(), Some("Prazo"));
        assert_eq!(lost.form.items.len(), 1);

        // Não-venda recuperada: a objeção some
        move_to(&service, &admin, quote.id, DealStatus::Finalized, None, None).await.unwrap();
        let recovered = service.get_deal(&admin, quote.id, DealStatus::Finalized).await.unwrap();
        assert!(recovered.form.general_objection.is_none());
        assert_eq!(recovered.code, "COT-B");

        // De volta a pendente não existe
        let err = move_to(&service, &admin, quote.id, DealStatus::Pending, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM deals").await, 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM deal_items").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sellers_only_list_their_own_quotes(pool: PgPool) {
        let admin = seller(&pool, "admin@empresa.com.br", UserRole::Admin).await;
        let ana = seller(&pool, "ana@empresa.com.br", UserRole::Vendedor).await;
        let bia = seller(&pool, "bia@empresa.com.br", UserRole::Vendedor).await;
        let service = DealService::new(pool.clone());

        service.create_quote(&ana, form("12345678000190", Some("COT-ANA"))).await.unwrap();
        service.create_quote(&bia, form("98765432000110", Some("COT-BIA"))).await.unwrap();

        // O filtro de vendedor é ignorado para quem não é admin
        let asked_for_bia = DealFilter { seller: Some(bia.id), ..Default::default() };
        let mine = service.list_deals(&ana, DealStatus::Pending, asked_for_bia.clone()).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].code, "COT-ANA");

        let all = service.list_deals(&admin, DealStatus::Pending, DealFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        let only_bia = service.list_deals(&admin, DealStatus::Pending, asked_for_bia).await.unwrap();
        assert_eq!(only_bia.len(), 1);
        assert_eq!(only_bia[0].code, "COT-BIA");

        assert!(service.list_deals(&ana, DealStatus::Finalized, DealFilter::default()).await.unwrap().is_empty());
    }
}
