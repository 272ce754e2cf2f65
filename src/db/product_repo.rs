// src/db/product_repo.rs

use sqlx::{Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{deal::ItemSnapshot, product::Product},
};

#[derive(Clone)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    /// Busca o produto pelo nome ou cria com os valores do primeiro uso.
    pub async fn find_or_create<'e, E>(
        &self,
        executor: E,
        item: &ItemSnapshot,
        created_by: Uuid,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O DO UPDATE "vazio" existe só para o RETURNING devolver a linha existente
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, unit, quantity, price, commission, icms, ipi, created_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
            .bind(&item.product_name)
            .bind(&item.unit)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.commission)
            .bind(item.icms)
            .bind(item.ipi)
            .bind(created_by)
            .fetch_one(executor)
            .await?;

        Ok(product)
    }

    pub async fn list<'e, E>(&self, executor: E, search: Option<&str>) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = format!("%{}%", search.unwrap_or("").trim());
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE name ILIKE $1 ORDER BY name ASC",
        )
            .bind(pattern)
            .fetch_all(executor)
            .await?;
        Ok(products)
    }
}
