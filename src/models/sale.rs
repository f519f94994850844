// src/models/sale.rs

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ingredient::IngredientUnit;

// Prefixos das referências anexadas aos movimentos.
pub const SALE_REFERENCE_PREFIX: &str = "TK";
pub const STOCK_REFERENCE_PREFIX: &str = "STK";

/// `<PREFIXO>-<epoch em ms>-<0..999>`, ex.: `TK-1727740800000-417`.
pub fn generate_reference(prefix: &str) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), suffix)
}

// --- Consumo agregado de um ingrediente por uma venda ---
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientUsage {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit: IngredientUnit,
}

/// Resultado do processamento de ingredientes, repassado à criação da venda.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedSaleIngredients {
    pub ingredient_usage: Vec<IngredientUsage>,
    pub ticket_number: String,
}

// --- Venda ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleProduct {
    #[serde(skip)]
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub ticket: String,
    pub client_name: String,
    #[serde(rename = "clientCI")]
    pub client_ci: String,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub sale_date: DateTime<Utc>,
    #[sqlx(skip)]
    pub products: Vec<SaleProduct>,
}

/// Soma `preço × quantidade` e aplica o desconto percentual.
pub fn sale_total(products: &[SaleProduct], discount_percent: Decimal) -> Decimal {
    let gross: Decimal = products
        .iter()
        .map(|p| p.price * Decimal::from(p.quantity))
        .sum();
    let total = gross - gross * discount_percent / Decimal::ONE_HUNDRED;
    total.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i32) -> SaleProduct {
        SaleProduct {
            sale_id: Uuid::nil(),
            product_id: Uuid::new_v4(),
            name: "pollo entero".into(),
            price: Decimal::from(price),
            quantity,
        }
    }

    #[test]
    fn references_follow_prefix_millis_random_layout() {
        let reference = generate_reference(SALE_REFERENCE_PREFIX);
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TK");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert!(parts[2].parse::<u16>().unwrap() < 1000);

        assert!(generate_reference(STOCK_REFERENCE_PREFIX).starts_with("STK-"));
    }

    #[test]
    fn total_applies_percentage_discount() {
        let products = vec![line(50, 2), line(20, 1)];
        assert_eq!(sale_total(&products, Decimal::ZERO), Decimal::from(120));
        assert_eq!(sale_total(&products, Decimal::from(10)), Decimal::from(108));
        assert_eq!(sale_total(&products, Decimal::ONE_HUNDRED), Decimal::ZERO);
    }

    #[test]
    fn sale_serializes_client_ci_like_the_frontend_expects() {
        let sale = Sale {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            ticket: "TK-1-1".into(),
            client_name: "Ana".into(),
            client_ci: "1234567".into(),
            discount: Decimal::ZERO,
            total_amount: Decimal::from(100),
            sale_date: Utc::now(),
            products: vec![line(50, 2)],
        };
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["clientCI"], "1234567");
        assert_eq!(json["products"][0]["quantity"], 2);
    }
}
