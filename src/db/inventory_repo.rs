// src/db/inventory_repo.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        DailyInventory, IngredientStats, InventoryMovement, InventoryStatus, LedgerEmployee, LedgerIngredient,
    },
};

const DAILY_UNIQUE_CONSTRAINT: &str = "daily_inventories_branch_day_key";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Cabeçalhos do livro-razão
    // ---

    /// Insere o cabeçalho. A unicidade (sucursal, dia) é garantida pelo índice,
    /// então duas aberturas simultâneas nunca criam dois documentos.
    pub async fn insert_header<'e, E>(&self, executor: E, ledger: &DailyInventory) -> Result<DailyInventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, DailyInventory>(
            r#"
            INSERT INTO daily_inventories (id, branch_id, business_date, date, status, employees, observations)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(ledger.id)
            .bind(ledger.branch_id)
            .bind(ledger.business_date)
            .bind(ledger.date)
            .bind(ledger.status)
            .bind(&ledger.employees)
            .bind(ledger.observations.as_deref())
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation()
                        && db_err.constraint().unwrap_or_default() == DAILY_UNIQUE_CONSTRAINT
                    {
                        return AppError::InventoryAlreadyExists;
                    }
                }
                e.into()
            })
    }

    pub async fn find_for_day<'e, E>(
        &self,
        executor: E,
        branch_id: Uuid,
        business_date: NaiveDate,
    ) -> Result<Option<DailyInventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ledger = sqlx::query_as::<_, DailyInventory>(
            "SELECT * FROM daily_inventories WHERE branch_id = $1 AND business_date = $2",
        )
            .bind(branch_id)
            .bind(business_date)
            .fetch_optional(executor)
            .await?;
        Ok(ledger)
    }

    /// O inventário ABERTO do dia, travado até o fim da transação.
    pub async fn lock_open_for_day<'e, E>(
        &self,
        executor: E,
        branch_id: Uuid,
        business_date: NaiveDate,
    ) -> Result<Option<DailyInventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ledger = sqlx::query_as::<_, DailyInventory>(
            r#"
            SELECT * FROM daily_inventories
            WHERE branch_id = $1 AND business_date = $2 AND status = 'open'
            FOR UPDATE
            "#,
        )
            .bind(branch_id)
            .bind(business_date)
            .fetch_optional(executor)
            .await?;
        Ok(ledger)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<DailyInventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ledger = sqlx::query_as::<_, DailyInventory>("SELECT * FROM daily_inventories WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(ledger)
    }

    pub async fn list_by_branch<'e, E>(&self, executor: E, branch_id: Uuid) -> Result<Vec<DailyInventory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ledgers = sqlx::query_as::<_, DailyInventory>(
            "SELECT * FROM daily_inventories WHERE branch_id = $1 ORDER BY business_date DESC",
        )
            .bind(branch_id)
            .fetch_all(executor)
            .await?;
        Ok(ledgers)
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: InventoryStatus) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE daily_inventories SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Só equipe e observações são editáveis; ingredientes e movimentos não.
    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        employees: Option<Vec<LedgerEmployee>>,
        observations: Option<&str>,
    ) -> Result<DailyInventory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, DailyInventory>(
            r#"
            UPDATE daily_inventories
            SET employees = COALESCE($2, employees),
                observations = COALESCE($3, observations)
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(employees.map(Json))
            .bind(observations)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::InventoryNotFound)
    }

    // ---
    // Linhas por ingrediente e movimentos
    // ---

    pub async fn insert_ingredient<'e, E>(&self, executor: E, line: &LedgerIngredient) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO inventory_ingredients (inventory_id, ingredient_id, name, unit, initial_stock, final_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
            .bind(line.inventory_id)
            .bind(line.ingredient_id)
            .bind(&line.name)
            .bind(line.unit)
            .bind(line.initial_stock)
            .bind(line.final_stock)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_final_stock<'e, E>(
        &self,
        executor: E,
        inventory_id: Uuid,
        ingredient_id: Uuid,
        final_stock: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE inventory_ingredients SET final_stock = $3 WHERE inventory_id = $1 AND ingredient_id = $2",
        )
            .bind(inventory_id)
            .bind(ingredient_id)
            .bind(final_stock)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_movement<'e, E>(&self, executor: E, movement: &InventoryMovement) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO inventory_movements
                (id, inventory_id, ingredient_id, date, movement_type, ingredient_name, quantity, unit, reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
            .bind(movement.id)
            .bind(movement.inventory_id)
            .bind(movement.ingredient_id)
            .bind(movement.date)
            .bind(movement.movement_type)
            .bind(&movement.ingredient_name)
            .bind(movement.quantity)
            .bind(movement.unit)
            .bind(&movement.reference)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Completa o cabeçalho com as linhas e os movimentos (duas consultas na mesma conexão).
    pub async fn hydrate(&self, conn: &mut PgConnection, mut ledger: DailyInventory) -> Result<DailyInventory, AppError> {
        let mut lines = sqlx::query_as::<_, LedgerIngredient>(
            "SELECT * FROM inventory_ingredients WHERE inventory_id = $1 ORDER BY name ASC",
        )
            .bind(ledger.id)
            .fetch_all(&mut *conn)
            .await?;

        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT * FROM inventory_movements
            WHERE inventory_id = $1
            ORDER BY date ASC, id ASC
            "#,
        )
            .bind(ledger.id)
            .fetch_all(&mut *conn)
            .await?;

        let mut by_ingredient: HashMap<Uuid, Vec<InventoryMovement>> = HashMap::new();
        for movement in movements {
            by_ingredient.entry(movement.ingredient_id).or_default().push(movement);
        }
        for line in &mut lines {
            line.movements = by_ingredient.remove(&line.ingredient_id).unwrap_or_default();
        }

        ledger.ingredients = lines;
        Ok(ledger)
    }

    // ---
    // Estatísticas
    // ---

    /// Médias de saldo inicial/final e totais por tipo de movimento,
    /// por ingrediente, nos inventários da sucursal desde `since`.
    pub async fn stats_since<'e, E>(
        &self,
        executor: E,
        branch_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<IngredientStats>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, IngredientStats>(
            r#"
            WITH movement_totals AS (
                SELECT
                    m.inventory_id,
                    m.ingredient_id,
                    COALESCE(SUM(-m.quantity) FILTER (WHERE m.movement_type = 'sale'), 0) AS consumed,
                    COALESCE(SUM(m.quantity) FILTER (WHERE m.movement_type = 'purchase'), 0) AS purchased,
                    COALESCE(SUM(m.quantity) FILTER (WHERE m.movement_type = 'adjustment'), 0) AS adjusted
                FROM inventory_movements m
                GROUP BY m.inventory_id, m.ingredient_id
            )
            SELECT
                li.ingredient_id,
                (ARRAY_AGG(li.name ORDER BY di.business_date DESC))[1] AS name,
                (ARRAY_AGG(li.unit ORDER BY di.business_date DESC))[1] AS unit,
                ROUND(AVG(li.initial_stock), 3) AS avg_initial_stock,
                ROUND(AVG(li.final_stock), 3) AS avg_final_stock,
                COALESCE(SUM(mt.consumed), 0) AS consumed_by_sales,
                COALESCE(SUM(mt.purchased), 0) AS purchased,
                COALESCE(SUM(mt.adjusted), 0) AS adjusted,
                COUNT(*) AS days_tracked
            FROM daily_inventories di
            JOIN inventory_ingredients li ON li.inventory_id = di.id
            LEFT JOIN movement_totals mt
                ON mt.inventory_id = li.inventory_id AND mt.ingredient_id = li.ingredient_id
            WHERE di.branch_id = $1 AND di.business_date >= $2
            GROUP BY li.ingredient_id
            ORDER BY name ASC
            "#,
        )
            .bind(branch_id)
            .bind(since)
            .fetch_all(executor)
            .await?;
        Ok(stats)
    }
}
