// src/models/inventory.rs

use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::ingredient::{Ingredient, IngredientUnit},
};

/// O "dia de operação" é o dia civil no fuso do servidor.
pub fn business_date_today() -> NaiveDate {
    Local::now().date_naive()
}

// --- 1. Estado do inventário diário ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "inventory_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InventoryStatus {
    Open,
    Closed,
}

// --- 2. Tipo de movimento ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "inventory_movement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Sale,
    Purchase,
    Adjustment,
}

impl MovementType {
    /// Correção manual: entrada positiva é compra, qualquer outra coisa é ajuste.
    pub fn for_manual_delta(delta: Decimal) -> Self {
        if delta > Decimal::ZERO {
            MovementType::Purchase
        } else {
            MovementType::Adjustment
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEmployee {
    pub employee_ci: String,
    pub name: String,
}

// --- 3. Movimento (imutável depois de anexado) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: Uuid,
    #[serde(skip)]
    pub inventory_id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    /// Negativo = consumo, positivo = entrada.
    pub quantity: Decimal,
    pub unit: IngredientUnit,
    pub reference: String,
}

impl InventoryMovement {
    pub fn new(
        inventory_id: Uuid,
        ingredient_id: Uuid,
        ingredient_name: &str,
        unit: IngredientUnit,
        movement_type: MovementType,
        quantity: Decimal,
        reference: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            inventory_id,
            date: Utc::now(),
            movement_type,
            ingredient_id,
            ingredient_name: ingredient_name.to_string(),
            quantity,
            unit,
            reference: reference.to_string(),
        }
    }
}

// --- 4. Linha do livro-razão por ingrediente ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerIngredient {
    #[serde(skip)]
    pub inventory_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub unit: IngredientUnit,
    pub initial_stock: Decimal,
    #[sqlx(skip)]
    pub movements: Vec<InventoryMovement>,
    pub final_stock: Decimal,
}

impl LedgerIngredient {
    pub fn snapshot(inventory_id: Uuid, ingredient: &Ingredient) -> Self {
        Self {
            inventory_id,
            ingredient_id: ingredient.id,
            name: ingredient.name.clone(),
            unit: ingredient.unit,
            initial_stock: ingredient.current_stock,
            movements: Vec::new(),
            final_stock: ingredient.current_stock,
        }
    }

    pub fn movement_total(&self) -> Decimal {
        self.movements.iter().map(|m| m.quantity).sum()
    }

    /// Recalcula `final_stock` do zero sobre todo o histórico.
    pub fn reconcile(&mut self) -> Decimal {
        self.final_stock = self.initial_stock + self.movement_total();
        self.final_stock
    }

    pub fn is_reconciled(&self) -> bool {
        self.final_stock == self.initial_stock + self.movement_total()
    }
}

// --- 5. Inventário diário (o livro-razão) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyInventory {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub business_date: NaiveDate,
    pub date: DateTime<Utc>,
    pub status: InventoryStatus,
    #[schema(value_type = Vec<LedgerEmployee>)]
    pub employees: Json<Vec<LedgerEmployee>>,
    pub observations: Option<String>,
    #[sqlx(skip)]
    pub ingredients: Vec<LedgerIngredient>,
}

impl DailyInventory {
    /// Abre o dia: fotografa o saldo atual de cada ingrediente da sucursal.
    pub fn open(
        branch_id: Uuid,
        business_date: NaiveDate,
        employees: Vec<LedgerEmployee>,
        observations: Option<String>,
        branch_ingredients: &[Ingredient],
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            branch_id,
            business_date,
            date: Utc::now(),
            status: InventoryStatus::Open,
            employees: Json(employees),
            observations,
            ingredients: branch_ingredients
                .iter()
                .map(|ingredient| LedgerIngredient::snapshot(id, ingredient))
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == InventoryStatus::Open
    }

    pub fn ensure_open(&self) -> Result<(), AppError> {
        if self.is_open() { Ok(()) } else { Err(AppError::InventoryClosed) }
    }

    pub fn ingredient(&self, ingredient_id: Uuid) -> Option<&LedgerIngredient> {
        self.ingredients.iter().find(|i| i.ingredient_id == ingredient_id)
    }

    /// Inclui no livro-razão aberto um ingrediente registrado depois da abertura.
    pub fn track_ingredient(&mut self, ingredient: &Ingredient) -> Result<&LedgerIngredient, AppError> {
        self.ensure_open()?;
        if let Some(pos) = self.ingredients.iter().position(|i| i.ingredient_id == ingredient.id) {
            return Ok(&self.ingredients[pos]);
        }
        self.ingredients.push(LedgerIngredient::snapshot(self.id, ingredient));
        Ok(&self.ingredients[self.ingredients.len() - 1])
    }

    /// Anexa um movimento e recalcula o saldo final do ingrediente.
    /// Falha sem alterar nada se o inventário estiver fechado, se o ingrediente
    /// não fizer parte da fotografia do dia ou se o saldo final ficaria negativo.
    pub fn apply_movement(&mut self, movement: InventoryMovement) -> Result<&LedgerIngredient, AppError> {
        self.ensure_open()?;

        let record = self
            .ingredients
            .iter_mut()
            .find(|i| i.ingredient_id == movement.ingredient_id)
            .ok_or_else(|| AppError::IngredientNotInInventory(movement.ingredient_name.clone()))?;

        let projected = record.initial_stock + record.movement_total() + movement.quantity;
        if projected < Decimal::ZERO {
            return Err(AppError::InsufficientStock {
                ingredient: record.name.clone(),
                current_stock: record.final_stock,
                unit: record.unit,
            });
        }

        record.movements.push(movement);
        record.reconcile();
        Ok(&*record)
    }

    /// Último recálculo e passagem para `closed`. Não há volta.
    pub fn close(&mut self) -> Result<(), AppError> {
        self.ensure_open()?;
        for record in &mut self.ingredients {
            record.reconcile();
        }
        self.status = InventoryStatus::Closed;
        Ok(())
    }

    pub fn is_reconciled(&self) -> bool {
        self.ingredients.iter().all(LedgerIngredient::is_reconciled)
    }
}

// --- 6. Estatísticas de uma janela de dias ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientStats {
    pub ingredient_id: Uuid,
    pub name: String,
    pub unit: IngredientUnit,
    pub avg_initial_stock: Decimal,
    pub avg_final_stock: Decimal,
    pub consumed_by_sales: Decimal,
    pub purchased: Decimal,
    pub adjusted: Decimal,
    pub days_tracked: i64,
}
