// src/models/ingredient.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Unidades de medida aceitas ---
// Não há conversão entre unidades: as quantidades de receita já vêm
// expressas na unidade nativa do ingrediente.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "ingredient_unit", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum IngredientUnit {
    Kg,
    G,
    L,
    Ml,
    Unidad,
}

impl IngredientUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientUnit::Kg => "kg",
            IngredientUnit::G => "g",
            IngredientUnit::L => "l",
            IngredientUnit::Ml => "ml",
            IngredientUnit::Unidad => "unidad",
        }
    }
}

impl std::fmt::Display for IngredientUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IngredientUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(IngredientUnit::Kg),
            "g" => Ok(IngredientUnit::G),
            "l" => Ok(IngredientUnit::L),
            "ml" => Ok(IngredientUnit::Ml),
            "unidad" => Ok(IngredientUnit::Unidad),
            other => Err(AppError::InvalidUnit(other.to_string())),
        }
    }
}

// --- Ingrediente (o "saldo" global) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub unit: IngredientUnit,
    pub current_stock: Decimal,
    pub cost: Decimal,
}

impl Ingredient {
    /// Saldo resultante de aplicar `delta` (negativo = consumo).
    /// Nunca deixa o estoque negativo: devolve `InsufficientStock` sem tocar no valor atual.
    pub fn stock_after(&self, delta: Decimal) -> Result<Decimal, AppError> {
        let new_stock = self.current_stock + delta;
        if new_stock < Decimal::ZERO {
            return Err(AppError::InsufficientStock {
                ingredient: self.name.clone(),
                current_stock: self.current_stock,
                unit: self.unit,
            });
        }
        Ok(new_stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn chicken(stock: i64) -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: "chicken".into(),
            unit: IngredientUnit::Kg,
            current_stock: Decimal::from(stock),
            cost: Decimal::from(12),
        }
    }

    #[test]
    fn consuming_within_stock_returns_new_balance() {
        let ingredient = chicken(10);
        assert_eq!(ingredient.stock_after(Decimal::from(-6)).unwrap(), Decimal::from(4));
        assert_eq!(ingredient.stock_after(Decimal::from(-10)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn consuming_past_zero_reports_ingredient_and_stock() {
        let ingredient = chicken(4);
        match ingredient.stock_after(Decimal::from(-5)) {
            Err(AppError::InsufficientStock { ingredient, current_stock, unit }) => {
                assert_eq!(ingredient, "chicken");
                assert_eq!(current_stock, Decimal::from(4));
                assert_eq!(unit, IngredientUnit::Kg);
            }
            other => panic!("esperava InsufficientStock, veio {:?}", other),
        }
    }

    #[test]
    fn unit_parsing_accepts_only_known_units() {
        assert_eq!(IngredientUnit::from_str("unidad").unwrap(), IngredientUnit::Unidad);
        assert_eq!(IngredientUnit::from_str("ml").unwrap(), IngredientUnit::Ml);
        assert!(matches!(IngredientUnit::from_str("lb"), Err(AppError::InvalidUnit(u)) if u == "lb"));
    }

    #[test]
    fn unit_serializes_lowercase() {
        let json = serde_json::to_string(&IngredientUnit::Kg).unwrap();
        assert_eq!(json, "\"kg\"");
        let unit: IngredientUnit = serde_json::from_str("\"unidad\"").unwrap();
        assert_eq!(unit, IngredientUnit::Unidad);
    }
}
