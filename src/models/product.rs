// src/models/product.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ingredient::IngredientUnit;

// --- Linha de receita ---
// `name` e `unit` são cópias desnormalizadas do ingrediente, só para evitar
// consultas extras; a fonte da verdade continua sendo a tabela de ingredientes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLine {
    #[serde(skip)]
    pub product_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub unit: IngredientUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name_product: String,
    pub price: Decimal,
    #[sqlx(skip)]
    pub recipe: Vec<RecipeLine>,
}

impl Product {
    pub fn has_recipe(&self) -> bool {
        !self.recipe.is_empty()
    }
}
