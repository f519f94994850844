// src/services/inventory_service.rs

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BranchRepository, IngredientRepository, InventoryRepository},
    models::{
        branch::Branch,
        ingredient::{Ingredient, IngredientUnit},
        inventory::{
            business_date_today, DailyInventory, IngredientStats, InventoryMovement, InventoryStatus, LedgerEmployee,
            MovementType,
        },
        sale::{generate_reference, STOCK_REFERENCE_PREFIX},
    },
};

// Janela das estatísticas: hoje e os seis dias anteriores.
const STATS_WINDOW_DAYS: u64 = 6;

/// Resultado de uma correção manual de estoque.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockAdjustment {
    pub ingredient: Ingredient,
    pub movement: InventoryMovement,
}

/// Um dia só aceita um inventário, aberto ou fechado.
pub fn ensure_day_is_free(existing: Option<&DailyInventory>) -> Result<(), AppError> {
    match existing {
        Some(_) => Err(AppError::InventoryAlreadyExists),
        None => Ok(()),
    }
}

/// Inventário de outra sucursal responde como inexistente.
pub fn ensure_owned_by(ledger: &DailyInventory, branch: &Branch) -> Result<(), AppError> {
    if ledger.branch_id != branch.id {
        return Err(AppError::InventoryNotInBranch);
    }
    Ok(())
}

#[derive(Clone)]
pub struct InventoryService {
    branch_repo: BranchRepository,
    ingredient_repo: IngredientRepository,
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(
        branch_repo: BranchRepository,
        ingredient_repo: IngredientRepository,
        inventory_repo: InventoryRepository,
        pool: PgPool,
    ) -> Self {
        Self { branch_repo, ingredient_repo, inventory_repo, pool }
    }

    // ---
    // Abertura e fechamento do dia
    // ---

    #[tracing::instrument(skip(self, employees, observations))]
    pub async fn open_inventory(
        &self,
        name_branch: &str,
        employees: Vec<LedgerEmployee>,
        observations: Option<String>,
    ) -> Result<DailyInventory, AppError> {
        let mut tx = self.pool.begin().await?;

        let branch = self.branch_repo.get_by_name(&mut *tx, name_branch).await?;
        let today = business_date_today();

        // O índice único cobre a corrida entre duas aberturas simultâneas.
        let existing = self.inventory_repo.find_for_day(&mut *tx, branch.id, today).await?;
        ensure_day_is_free(existing.as_ref())?;

        let ingredients = self.ingredient_repo.find_by_branch(&mut *tx, branch.id).await?;
        let ledger = DailyInventory::open(branch.id, today, employees, observations, &ingredients);

        let mut saved = self.inventory_repo.insert_header(&mut *tx, &ledger).await?;
        for line in &ledger.ingredients {
            self.inventory_repo.insert_ingredient(&mut *tx, line).await?;
        }
        saved.ingredients = ledger.ingredients;

        tx.commit().await?;

        tracing::info!(
            inventory_id = %saved.id,
            ingredients = saved.ingredients.len(),
            "📒 Inventário do dia aberto"
        );
        Ok(saved)
    }

    #[tracing::instrument(skip(self))]
    pub async fn close_inventory(&self, name_branch: &str) -> Result<DailyInventory, AppError> {
        let mut tx = self.pool.begin().await?;

        let branch = self.branch_repo.get_by_name(&mut *tx, name_branch).await?;
        let header = self
            .inventory_repo
            .lock_open_for_day(&mut *tx, branch.id, business_date_today())
            .await?
            .ok_or(AppError::InventoryNotFound)?;

        let mut ledger = self.inventory_repo.hydrate(&mut *tx, header).await?;
        ledger.close()?;

        for line in &ledger.ingredients {
            self.inventory_repo
                .update_final_stock(&mut *tx, ledger.id, line.ingredient_id, line.final_stock)
                .await?;
        }
        self.inventory_repo.set_status(&mut *tx, ledger.id, InventoryStatus::Closed).await?;

        tx.commit().await?;

        tracing::info!(inventory_id = %ledger.id, "🔒 Inventário do dia fechado");
        Ok(ledger)
    }

    // ---
    // Consultas
    // ---

    pub async fn list_by_branch(&self, name_branch: &str) -> Result<Vec<DailyInventory>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let branch = self.branch_repo.get_by_name(&mut *conn, name_branch).await?;

        let headers = self.inventory_repo.list_by_branch(&mut *conn, branch.id).await?;
        let mut ledgers = Vec::with_capacity(headers.len());
        for header in headers {
            ledgers.push(self.inventory_repo.hydrate(&mut conn, header).await?);
        }
        Ok(ledgers)
    }

    pub async fn current(&self, name_branch: &str) -> Result<DailyInventory, AppError> {
        self.by_date(name_branch, business_date_today()).await
    }

    pub async fn by_date(&self, name_branch: &str, business_date: NaiveDate) -> Result<DailyInventory, AppError> {
        let mut conn = self.pool.acquire().await?;
        let branch = self.branch_repo.get_by_name(&mut *conn, name_branch).await?;

        let header = self
            .inventory_repo
            .find_for_day(&mut *conn, branch.id, business_date)
            .await?
            .ok_or(AppError::InventoryNotFound)?;
        self.inventory_repo.hydrate(&mut conn, header).await
    }

    /// Busca por id, conferindo que o documento é da sucursal informada.
    pub async fn by_id(&self, name_branch: &str, id: Uuid) -> Result<(DailyInventory, Branch), AppError> {
        let mut conn = self.pool.acquire().await?;
        let branch = self.branch_repo.get_by_name(&mut *conn, name_branch).await?;

        let header = self
            .inventory_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or(AppError::InventoryNotFound)?;
        ensure_owned_by(&header, &branch)?;

        let ledger = self.inventory_repo.hydrate(&mut conn, header).await?;
        Ok((ledger, branch))
    }

    pub async fn stats(&self, name_branch: &str) -> Result<Vec<IngredientStats>, AppError> {
        let branch = self.branch_repo.get_by_name_from_pool(name_branch).await?;
        let since = business_date_today()
            .checked_sub_days(Days::new(STATS_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);

        self.inventory_repo.stats_since(self.inventory_repo.pool(), branch.id, since).await
    }

    #[tracing::instrument(skip(self, employees, observations))]
    pub async fn update_details(
        &self,
        id: Uuid,
        name_branch: &str,
        employees: Option<Vec<LedgerEmployee>>,
        observations: Option<String>,
    ) -> Result<DailyInventory, AppError> {
        let mut tx = self.pool.begin().await?;

        let branch = self.branch_repo.get_by_name(&mut *tx, name_branch).await?;
        let current = self
            .inventory_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::InventoryNotFound)?;
        ensure_owned_by(&current, &branch)?;

        let header = self
            .inventory_repo
            .update_details(&mut *tx, id, employees, observations.as_deref())
            .await?;
        let ledger = self.inventory_repo.hydrate(&mut *tx, header).await?;

        tx.commit().await?;
        Ok(ledger)
    }

    // ---
    // Ingredientes da sucursal
    // ---

    /// Cadastra um ingrediente na sucursal. Se já houver inventário aberto hoje,
    /// o ingrediente entra na fotografia do dia com o saldo com que nasceu.
    #[tracing::instrument(skip(self, current_stock, cost))]
    pub async fn register_ingredient(
        &self,
        name_branch: &str,
        name: &str,
        unit: IngredientUnit,
        current_stock: Decimal,
        cost: Decimal,
    ) -> Result<Ingredient, AppError> {
        let mut tx = self.pool.begin().await?;

        let branch = self.branch_repo.get_by_name(&mut *tx, name_branch).await?;
        let open_ledger = self
            .inventory_repo
            .lock_open_for_day(&mut *tx, branch.id, business_date_today())
            .await?;

        let ingredient = self
            .ingredient_repo
            .create(&mut *tx, name.trim(), unit, current_stock, cost)
            .await?;
        self.ingredient_repo.link_to_branch(&mut *tx, branch.id, ingredient.id).await?;

        if let Some(header) = open_ledger {
            let mut ledger = self.inventory_repo.hydrate(&mut *tx, header).await?;
            let line = ledger.track_ingredient(&ingredient)?;
            self.inventory_repo.insert_ingredient(&mut *tx, line).await?;
            tracing::info!(inventory_id = %ledger.id, "Ingrediente incluído no inventário aberto");
        }

        tx.commit().await?;

        tracing::info!(ingredient_id = %ingredient.id, "🧂 Ingrediente registrado");
        Ok(ingredient)
    }

    pub async fn list_ingredients(&self, name_branch: &str) -> Result<Vec<Ingredient>, AppError> {
        let branch = self.branch_repo.get_by_name_from_pool(name_branch).await?;
        self.ingredient_repo.list_for_branch(branch.id).await
    }

    #[tracing::instrument(skip(self, cost))]
    pub async fn update_ingredient(
        &self,
        name_branch: &str,
        ingredient_id: Uuid,
        name: Option<&str>,
        unit: Option<IngredientUnit>,
        cost: Option<Decimal>,
    ) -> Result<Ingredient, AppError> {
        let mut tx = self.pool.begin().await?;

        let branch = self.branch_repo.get_by_name(&mut *tx, name_branch).await?;
        self.ingredient_repo
            .lock_in_branch(&mut *tx, branch.id, ingredient_id)
            .await?
            .ok_or(AppError::IngredientNotFound)?;

        let updated = self
            .ingredient_repo
            .update_details(&mut *tx, ingredient_id, name.map(str::trim), unit, cost)
            .await?
            .ok_or(AppError::IngredientNotFound)?;

        tx.commit().await?;
        Ok(updated)
    }

    // ---
    // Correção manual de estoque
    // ---

    /// Soma `quantity` (com sinal) ao saldo do ingrediente e registra o movimento
    /// no inventário aberto do dia: `purchase` se positivo, `adjustment` caso contrário.
    #[tracing::instrument(skip(self, observations))]
    pub async fn adjust_stock(
        &self,
        name_branch: &str,
        ingredient_id: Uuid,
        quantity: Decimal,
        observations: Option<&str>,
    ) -> Result<StockAdjustment, AppError> {
        if quantity.is_zero() {
            return Err(AppError::InvalidInput("quantity".into()));
        }

        let mut tx = self.pool.begin().await?;

        let branch = self.branch_repo.get_by_name(&mut *tx, name_branch).await?;

        // Ordem de travamento igual à das vendas: primeiro o inventário, depois o ingrediente.
        let open_ledger = self
            .inventory_repo
            .lock_open_for_day(&mut *tx, branch.id, business_date_today())
            .await?;
        let ingredient = self
            .ingredient_repo
            .lock_in_branch(&mut *tx, branch.id, ingredient_id)
            .await?
            .ok_or(AppError::IngredientNotFound)?;
        let header = open_ledger.ok_or(AppError::NoOpenInventory)?;

        ingredient.stock_after(quantity)?;

        let mut ledger = self.inventory_repo.hydrate(&mut *tx, header).await?;
        let reference = generate_reference(STOCK_REFERENCE_PREFIX);
        let movement = InventoryMovement::new(
            ledger.id,
            ingredient.id,
            &ingredient.name,
            ingredient.unit,
            MovementType::for_manual_delta(quantity),
            quantity,
            &reference,
        );
        let final_stock = ledger.apply_movement(movement.clone())?.final_stock;

        let updated = self
            .ingredient_repo
            .apply_stock_delta(&mut *tx, ingredient.id, quantity)
            .await?
            .ok_or_else(|| AppError::InsufficientStock {
                ingredient: ingredient.name.clone(),
                current_stock: ingredient.current_stock,
                unit: ingredient.unit,
            })?;

        self.inventory_repo.insert_movement(&mut *tx, &movement).await?;
        self.inventory_repo
            .update_final_stock(&mut *tx, ledger.id, ingredient.id, final_stock)
            .await?;

        tx.commit().await?;

        tracing::info!(
            ingredient_id = %updated.id,
            %quantity,
            reference = %reference,
            observations = observations.unwrap_or_default(),
            "📦 Estoque ajustado"
        );
        Ok(StockAdjustment { ingredient: updated, movement })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn branch() -> Branch {
        Branch {
            id: Uuid::new_v4(),
            name_branch: "central".into(),
            address: "Av. Siempre Viva".into(),
            phone: "70000000".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn chicken() -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: "chicken".into(),
            unit: IngredientUnit::Kg,
            current_stock: Decimal::from(10),
            cost: Decimal::from(12),
        }
    }

    #[test]
    fn second_open_on_same_day_conflicts_and_leaves_first_untouched() {
        let branch = branch();
        let stock = chicken();
        let day = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let first = DailyInventory::open(branch.id, day, vec![], None, &[stock.clone()]);

        assert!(ensure_day_is_free(None).is_ok());
        let err = ensure_day_is_free(Some(&first)).unwrap_err();

        assert!(matches!(err, AppError::InventoryAlreadyExists));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(first.status, InventoryStatus::Open);
        assert_eq!(first.ingredients.len(), 1);
        assert_eq!(first.ingredients[0].initial_stock, stock.current_stock);
    }

    #[test]
    fn closed_ledger_still_blocks_reopening() {
        let branch = branch();
        let day = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let mut ledger = DailyInventory::open(branch.id, day, vec![], None, &[chicken()]);
        ledger.close().unwrap();

        assert!(matches!(ensure_day_is_free(Some(&ledger)), Err(AppError::InventoryAlreadyExists)));
    }

    #[test]
    fn ledger_of_another_branch_is_not_found() {
        let mine = branch();
        let other = branch();
        let day = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let ledger = DailyInventory::open(other.id, day, vec![], None, &[]);

        assert!(ensure_owned_by(&ledger, &other).is_ok());
        let err = ensure_owned_by(&ledger, &mine).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
