// src/db/client_repo.rs

use sqlx::{Postgres, Executor, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::client::{Client, ClientDealStats, ClientFilter, ClientInput},
};

#[derive(Clone)]
pub struct ClientRepository;

impl ClientRepository {
    pub fn new() -> Self {
        Self
    }

    /// Busca pelo CNPJ ou cria. Um único comando, então duas cotações
    /// simultâneas para o mesmo CNPJ nunca geram dois clientes.
    /// `recurring` só liga a flag, nunca desliga.
    pub async fn upsert_by_cnpj<'e, E>(
        &self,
        executor: E,
        input: &ClientInput,
        recurring: bool,
        created_by: Uuid,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                name, cnpj, segment, company_name, whatsapp, origin, recurring, created_by_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (cnpj) DO UPDATE SET
                recurring = clients.recurring OR EXCLUDED.recurring,
                whatsapp = COALESCE(clients.whatsapp, EXCLUDED.whatsapp),
                company_name = COALESCE(clients.company_name, EXCLUDED.company_name),
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(&input.name)
            .bind(&input.cnpj)
            .bind(&input.segment)
            .bind(input.company_name.as_deref())
            .bind(input.whatsapp.as_deref())
            .bind(&input.origin)
            .bind(recurring)
            .bind(created_by)
            .fetch_one(executor)
            .await?;

        Ok(client)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(client)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &ClientFilter,
        only_with_whatsapp: bool,
    ) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT c.* FROM clients c WHERE TRUE");
        filter.push_conditions(&mut qb);
        if only_with_whatsapp {
            qb.push(" AND c.whatsapp IS NOT NULL AND c.whatsapp <> ''");
        }
        qb.push(" ORDER BY c.name ASC");

        let clients = qb.build_query_as::<Client>().fetch_all(executor).await?;
        Ok(clients)
    }

    pub async fn deal_stats<'e, E>(&self, executor: E, client_id: Uuid) -> Result<ClientDealStats, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, ClientDealStats>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pendente') AS pending,
                COUNT(*) FILTER (WHERE status = 'finalizada') AS sales,
                COUNT(*) FILTER (WHERE status = 'cancelada') AS lost,
                COALESCE(SUM(total_value) FILTER (WHERE status = 'finalizada'), 0) AS sales_total
            FROM deals
            WHERE client_id = $1
            "#,
        )
            .bind(client_id)
            .fetch_one(executor)
            .await?;
        Ok(stats)
    }

    pub async fn update_tags<'e, E>(&self, executor: E, client_id: Uuid, tags: &[String]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE clients SET tags = $1, updated_at = NOW() WHERE id = $2")
            .bind(tags)
            .bind(client_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_whatsapp<'e, E>(&self, executor: E, client_id: Uuid, whatsapp: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE clients SET whatsapp = $1, updated_at = NOW() WHERE id = $2")
            .bind(whatsapp)
            .bind(client_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
