// src/db/ingredient_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::ingredient::{Ingredient, IngredientUnit},
};

#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

impl IngredientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn find_by_branch<'e, E>(&self, executor: E, branch_id: Uuid) -> Result<Vec<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT i.*
            FROM ingredients i
            JOIN branch_ingredients bi ON bi.ingredient_id = i.id
            WHERE bi.branch_id = $1
            ORDER BY i.name ASC
            "#,
        )
            .bind(branch_id)
            .fetch_all(executor)
            .await?;
        Ok(ingredients)
    }

    pub async fn list_for_branch(&self, branch_id: Uuid) -> Result<Vec<Ingredient>, AppError> {
        self.find_by_branch(&self.pool, branch_id).await
    }

    /// Busca e TRAVA (FOR UPDATE) um ingrediente que pertença à sucursal.
    pub async fn lock_in_branch<'e, E>(
        &self,
        executor: E,
        branch_id: Uuid,
        ingredient_id: Uuid,
    ) -> Result<Option<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT i.*
            FROM ingredients i
            JOIN branch_ingredients bi ON bi.ingredient_id = i.id
            WHERE bi.branch_id = $1 AND i.id = $2
            FOR UPDATE OF i
            "#,
        )
            .bind(branch_id)
            .bind(ingredient_id)
            .fetch_optional(executor)
            .await?;
        Ok(ingredient)
    }

    /// Trava várias linhas sempre na mesma ordem (por id), evitando deadlock
    /// entre vendas concorrentes que tocam os mesmos ingredientes.
    pub async fn lock_many<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(ingredients)
    }

    // ---
    // Escrita
    // ---

    /// Soma `delta` ao saldo numa única instrução condicional.
    /// Se o resultado ficaria negativo no momento da escrita, nada muda e volta `None`.
    pub async fn apply_stock_delta<'e, E>(
        &self,
        executor: E,
        ingredient_id: Uuid,
        delta: Decimal,
    ) -> Result<Option<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients
            SET current_stock = current_stock + $2
            WHERE id = $1 AND current_stock + $2 >= 0
            RETURNING *
            "#,
        )
            .bind(ingredient_id)
            .bind(delta)
            .fetch_optional(executor)
            .await?;
        Ok(updated)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        unit: IngredientUnit,
        current_stock: Decimal,
        cost: Decimal,
    ) -> Result<Ingredient, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (name, unit, current_stock, cost)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(unit)
            .bind(current_stock)
            .bind(cost)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::IngredientNameAlreadyExists(name.to_string());
                    }
                }
                e.into()
            })
    }

    pub async fn link_to_branch<'e, E>(&self, executor: E, branch_id: Uuid, ingredient_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO branch_ingredients (branch_id, ingredient_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
            .bind(branch_id)
            .bind(ingredient_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Atualiza só os dados descritivos. O saldo muda apenas por movimentos.
    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        ingredient_id: Uuid,
        name: Option<&str>,
        unit: Option<IngredientUnit>,
        cost: Option<Decimal>,
    ) -> Result<Option<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients
            SET name = COALESCE($2, name),
                unit = COALESCE($3, unit),
                cost = COALESCE($4, cost)
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(ingredient_id)
            .bind(name)
            .bind(unit)
            .bind(cost)
            .fetch_optional(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::IngredientNameAlreadyExists(name.unwrap_or_default().to_string());
                    }
                }
                e.into()
            })
    }
}
