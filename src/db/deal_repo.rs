// src/db/deal_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Executor, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::deal::{Deal, DealFilter, DealItem, DealListEntry, DealStatus, ItemSnapshot},
};

/// Colunas gravadas tanto na criação quanto na edição/conversão.
#[derive(Debug, Clone)]
pub struct DealFields<'a> {
    pub code: &'a str,
    pub status: DealStatus,
    pub total_value: Decimal,
    pub payment_terms: &'a str,
    pub recurring_sale: bool,
    pub recurrence_name: Option<&'a str>,
    pub general_objection: Option<&'a str>,
    pub client_id: Uuid,
}

#[derive(Clone)]
pub struct DealRepository;

impl DealRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CÓDIGOS
    // =========================================================================

    /// O código já pertence a outra negociação? `except` ignora a própria linha na edição.
    pub async fn code_exists<'e, E>(
        &self,
        executor: E,
        code: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM deals WHERE code = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
            .bind(code)
            .bind(except)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    // =========================================================================
    //  NEGOCIAÇÕES
    // =========================================================================

    pub async fn create_deal<'e, E>(
        &self,
        executor: E,
        fields: &DealFields<'_>,
        seller_id: Uuid,
    ) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as::<_, Deal>(
            r#"
            INSERT INTO deals (
                code, status, total_value, payment_terms, recurring_sale,
                recurrence_name, general_objection, client_id, seller_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(fields.code)
            .bind(fields.status)
            .bind(fields.total_value)
            .bind(fields.payment_terms)
            .bind(fields.recurring_sale)
            .bind(fields.recurrence_name)
            .bind(fields.general_objection)
            .bind(fields.client_id)
            .bind(seller_id)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                // A checagem prévia pode perder a corrida; o índice único não perde.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::DuplicateCode(fields.code.to_string());
                    }
                }
                e.into()
            })?;

        Ok(deal)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as::<_, Deal>("SELECT * FROM deals WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(deal)
    }

    /// Igual ao `find_by_id`, mas trava a linha até o fim da transação.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Deal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as::<_, Deal>("SELECT * FROM deals WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(deal)
    }

    /// Grava todos os campos de uma vez. É o único caminho de mudança de status.
    pub async fn update_deal<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &DealFields<'_>,
        closed_at: Option<DateTime<Utc>>,
        edited_by: Uuid,
    ) -> Result<Deal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deal = sqlx::query_as::<_, Deal>(
            r#"
            UPDATE deals
            SET code = $2,
                status = $3,
                total_value = $4,
                payment_terms = $5,
                recurring_sale = $6,
                recurrence_name = $7,
                general_objection = $8,
                client_id = $9,
                closed_at = $10,
                edited_by_id = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(fields.code)
            .bind(fields.status)
            .bind(fields.total_value)
            .bind(fields.payment_terms)
            .bind(fields.recurring_sale)
            .bind(fields.recurrence_name)
            .bind(fields.general_objection)
            .bind(fields.client_id)
            .bind(closed_at)
            .bind(edited_by)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::DuplicateCode(fields.code.to_string());
                    }
                }
                e.into()
            })?;

        Ok(deal)
    }

    /// Remove sem checar existência. Os itens vão junto (ON DELETE CASCADE).
    /// `seller` restringe ao dono quando quem pede não é administrador.
    pub async fn delete_deal<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: DealStatus,
        seller: Option<Uuid>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM deals WHERE id = $1 AND status = $2 AND ($3::uuid IS NULL OR seller_id = $3)",
        )
            .bind(id)
            .bind(status)
            .bind(seller)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_deals<'e, E>(
        &self,
        executor: E,
        status: DealStatus,
        filter: &DealFilter,
    ) -> Result<Vec<DealListEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                d.id, d.code, d.status, d.total_value, d.payment_terms, d.recurring_sale,
                d.general_objection, d.client_id,
                c.name AS client_name, c.cnpj AS client_cnpj, c.segment,
                d.seller_id, u.name AS seller_name,
                d.created_at, d.closed_at
            FROM deals d
            JOIN clients c ON c.id = d.client_id
            JOIN users u ON u.id = d.seller_id
            WHERE d.status = "#,
        );
        qb.push_bind(status);
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY d.created_at DESC");

        let deals = qb.build_query_as::<DealListEntry>().fetch_all(executor).await?;
        Ok(deals)
    }

    pub async fn seller_name<'e, E>(&self, executor: E, seller_id: Uuid) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM users WHERE id = $1")
            .bind(seller_id)
            .fetch_optional(executor)
            .await?;
        Ok(name.unwrap_or_default())
    }

    // =========================================================================
    //  ITENS (snapshots)
    // =========================================================================

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        deal_id: Uuid,
        product_id: Uuid,
        position: i32,
        item: &ItemSnapshot,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO deal_items (
                deal_id, product_id, quantity, price, unit, commission, icms, ipi,
                competitor_price, competitor_name, competitor_icms, competitor_ipi,
                objection, info_unavailable, position
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
            .bind(deal_id)
            .bind(product_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(&item.unit)
            .bind(item.commission)
            .bind(item.icms)
            .bind(item.ipi)
            .bind(item.competitor_price)
            .bind(item.competitor_name.as_deref())
            .bind(item.competitor_icms)
            .bind(item.competitor_ipi)
            .bind(item.objection.as_deref())
            .bind(item.info_unavailable)
            .bind(position)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Itens nunca são alterados um a um: apaga tudo e recria.
    pub async fn delete_items<'e, E>(&self, executor: E, deal_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM deal_items WHERE deal_id = $1")
            .bind(deal_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_items<'e, E>(&self, executor: E, deal_id: Uuid) -> Result<Vec<DealItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, DealItem>(
            r#"
            SELECT di.*, p.name AS product_name
            FROM deal_items di
            JOIN products p ON p.id = di.product_id
            WHERE di.deal_id = $1
            ORDER BY di.position ASC
            "#,
        )
            .bind(deal_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }
}
