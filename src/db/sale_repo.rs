// src/db/sale_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::sale::{Sale, SaleProduct},
};

// Vendas só são gravadas dentro da transação de `SaleService`.
#[derive(Clone, Default)]
pub struct SaleRepository;

impl SaleRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_sale<'e, E>(&self, executor: E, sale: &Sale) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (id, branch_id, ticket, client_name, client_ci, discount, total_amount, sale_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(sale.id)
            .bind(sale.branch_id)
            .bind(&sale.ticket)
            .bind(&sale.client_name)
            .bind(&sale.client_ci)
            .bind(sale.discount)
            .bind(sale.total_amount)
            .bind(sale.sale_date)
            .fetch_one(executor)
            .await?;
        Ok(saved)
    }

    pub async fn insert_product<'e, E>(&self, executor: E, position: i32, line: &SaleProduct) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO sale_products (sale_id, position, product_id, name, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
            .bind(line.sale_id)
            .bind(position)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.price)
            .bind(line.quantity)
            .execute(executor)
            .await?;
        Ok(())
    }
}
