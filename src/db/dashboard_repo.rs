// src/db/dashboard_repo.rs

use sqlx::{Postgres, Executor, QueryBuilder};
use crate::{
    common::error::AppError,
    models::dashboard::{
        DashboardFilter, ObjectionEntry, SellerPerformance, StatusTotals, TopClientEntry,
        TopProductEntry,
    },
};

#[derive(Clone)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Contagem e soma por status (os cards)
    pub async fn status_totals<'e, E>(
        &self,
        executor: E,
        filter: &DashboardFilter,
    ) -> Result<Vec<StatusTotals>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT d.status, COUNT(*) AS count, COALESCE(SUM(d.total_value), 0) AS total
            FROM deals d
            WHERE TRUE"#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY d.status");

        let rows = qb.build_query_as::<StatusTotals>().fetch_all(executor).await?;
        Ok(rows)
    }

    // 2. Desempenho por vendedor
    pub async fn seller_performance<'e, E>(
        &self,
        executor: E,
        filter: &DashboardFilter,
    ) -> Result<Vec<SellerPerformance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                u.id AS seller_id,
                u.name AS seller_name,
                COUNT(*) FILTER (WHERE d.status = 'pendente') AS quotes,
                COUNT(*) FILTER (WHERE d.status = 'finalizada') AS sales,
                COUNT(*) FILTER (WHERE d.status = 'cancelada') AS lost,
                COALESCE(SUM(d.total_value) FILTER (WHERE d.status = 'finalizada'), 0) AS sales_total
            FROM deals d
            JOIN users u ON u.id = d.seller_id
            WHERE TRUE"#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY u.id, u.name ORDER BY sales_total DESC");

        let rows = qb.build_query_as::<SellerPerformance>().fetch_all(executor).await?;
        Ok(rows.into_iter().map(SellerPerformance::with_rate).collect())
    }

    // 3. Top produtos vendidos (em R$)
    pub async fn top_products<'e, E>(
        &self,
        executor: E,
        filter: &DashboardFilter,
        limit: i64,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                COALESCE(SUM(di.quantity), 0) AS total_quantity,
                COALESCE(SUM(di.quantity * di.price), 0) AS total_revenue
            FROM deal_items di
            JOIN deals d ON d.id = di.deal_id
            JOIN products p ON p.id = di.product_id
            WHERE d.status = 'finalizada'"#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY p.id, p.name ORDER BY total_revenue DESC LIMIT ");
        qb.push_bind(limit);

        let rows = qb.build_query_as::<TopProductEntry>().fetch_all(executor).await?;
        Ok(rows)
    }

    // 4. Top clientes
    pub async fn top_clients<'e, E>(
        &self,
        executor: E,
        filter: &DashboardFilter,
        limit: i64,
    ) -> Result<Vec<TopClientEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                c.id AS client_id,
                c.name AS client_name,
                COUNT(*) AS sales_count,
                COALESCE(SUM(d.total_value), 0) AS sales_total
            FROM deals d
            JOIN clients c ON c.id = d.client_id
            WHERE d.status = 'finalizada'"#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY c.id, c.name ORDER BY sales_total DESC LIMIT ");
        qb.push_bind(limit);

        let rows = qb.build_query_as::<TopClientEntry>().fetch_all(executor).await?;
        Ok(rows)
    }

    // 5. Objeções mais comuns nas não-vendas
    pub async fn objections<'e, E>(
        &self,
        executor: E,
        filter: &DashboardFilter,
    ) -> Result<Vec<ObjectionEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COALESCE(NULLIF(TRIM(d.general_objection), ''), 'Não informada') AS objection,
                COUNT(*) AS count
            FROM deals d
            WHERE d.status = 'cancelada'"#,
        );
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY 1 ORDER BY count DESC");

        let rows = qb.build_query_as::<ObjectionEntry>().fetch_all(executor).await?;
        Ok(rows)
    }
}
