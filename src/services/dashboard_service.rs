// src/services/dashboard_service.rs

use sqlx::{Postgres, Executor};
use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{
        auth::Principal,
        dashboard::{
            DashboardFilter, DashboardSummary, ObjectionEntry, SellerPerformance, TopClientEntry,
            TopProductEntry,
        },
    },
};

// Tamanho dos rankings
const TOP_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        principal: &Principal,
        filter: DashboardFilter,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let filter = filter.scoped(principal);
        let totals = self.repo.status_totals(executor, &filter).await?;
        Ok(DashboardSummary::from_totals(&totals))
    }

    pub async fn get_seller_performance<'e, E>(
        &self,
        executor: E,
        principal: &Principal,
        filter: DashboardFilter,
    ) -> Result<Vec<SellerPerformance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.seller_performance(executor, &filter.scoped(principal)).await
    }

    pub async fn get_top_products<'e, E>(
        &self,
        executor: E,
        principal: &Principal,
        filter: DashboardFilter,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.top_products(executor, &filter.scoped(principal), TOP_LIMIT).await
    }

    pub async fn get_top_clients<'e, E>(
        &self,
        executor: E,
        principal: &Principal,
        filter: DashboardFilter,
    ) -> Result<Vec<TopClientEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.top_clients(executor, &filter.scoped(principal), TOP_LIMIT).await
    }

    pub async fn get_objections<'e, E>(
        &self,
        executor: E,
        principal: &Principal,
        filter: DashboardFilter,
    ) -> Result<Vec<ObjectionEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.objections(executor, &filter.scoped(principal)).await
    }
}
