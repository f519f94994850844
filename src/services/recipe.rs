// src/services/recipe.rs

use std::{collections::HashMap, str::FromStr};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{product::Product, sale::IngredientUsage},
};

/// O que fazer com uma linha de venda cujo produto não existe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownProductPolicy {
    /// Falha com `InvalidReference`.
    #[default]
    Reject,
    /// Descarta a linha (com aviso no log).
    Skip,
}

impl FromStr for UnknownProductPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(UnknownProductPolicy::Reject),
            "skip" => Ok(UnknownProductPolicy::Skip),
            other => Err(anyhow::anyhow!("UNKNOWN_PRODUCT_POLICY inválida: {}", other)),
        }
    }
}

/// Uma linha pedida: produto e quantidade vendida.
#[derive(Debug, Clone, Copy)]
pub struct ProductQuantity {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Agrega o consumo de ingredientes de uma lista de produtos vendidos.
///
/// Produto sem receita contribui zero. Para cada linha de receita soma
/// `amount × quantity` por ingrediente. O resultado vem ordenado por id do
/// ingrediente, a ordem em que as linhas de estoque serão travadas.
pub fn resolve_ingredient_usage(
    lines: &[ProductQuantity],
    products: &HashMap<Uuid, Product>,
    policy: UnknownProductPolicy,
) -> Result<Vec<IngredientUsage>, AppError> {
    let mut usage: HashMap<Uuid, IngredientUsage> = HashMap::new();

    for line in lines {
        let Some(product) = products.get(&line.product_id) else {
            match policy {
                UnknownProductPolicy::Reject => return Err(AppError::InvalidReference(line.product_id)),
                UnknownProductPolicy::Skip => {
                    tracing::warn!(product_id = %line.product_id, "Produto inexistente ignorado no cálculo de ingredientes");
                    continue;
                }
            }
        };

        if !product.has_recipe() {
            continue;
        }

        let sold = Decimal::from(line.quantity);
        for recipe_line in &product.recipe {
            let total = recipe_line.amount * sold;
            usage
                .entry(recipe_line.ingredient_id)
                .and_modify(|u| u.quantity += total)
                .or_insert_with(|| IngredientUsage {
                    ingredient_id: recipe_line.ingredient_id,
                    name: recipe_line.name.clone(),
                    quantity: total,
                    unit: recipe_line.unit,
                });
        }
    }

    let mut usage: Vec<IngredientUsage> = usage.into_values().collect();
    usage.sort_by_key(|u| u.ingredient_id);
    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ingredient::IngredientUnit, product::RecipeLine};

    fn product(recipe: Vec<(Uuid, &str, i64)>) -> Product {
        let id = Uuid::new_v4();
        Product {
            id,
            name_product: "combo".into(),
            price: Decimal::from(35),
            recipe: recipe
                .into_iter()
                .map(|(ingredient_id, name, amount)| RecipeLine {
                    product_id: id,
                    ingredient_id,
                    name: name.into(),
                    amount: Decimal::from(amount),
                    unit: IngredientUnit::Kg,
                })
                .collect(),
        }
    }

    fn catalog(products: &[Product]) -> HashMap<Uuid, Product> {
        products.iter().map(|p| (p.id, p.clone())).collect()
    }

    #[test]
    fn multiplies_amount_by_quantity() {
        let chicken = Uuid::new_v4();
        let broaster = product(vec![(chicken, "chicken", 3)]);
        let lines = [ProductQuantity { product_id: broaster.id, quantity: 2 }];

        let usage = resolve_ingredient_usage(&lines, &catalog(&[broaster]), UnknownProductPolicy::Reject).unwrap();

        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].ingredient_id, chicken);
        assert_eq!(usage[0].quantity, Decimal::from(6));
    }

    #[test]
    fn sums_shared_ingredients_across_products() {
        let chicken = Uuid::new_v4();
        let potato = Uuid::new_v4();
        let a = product(vec![(chicken, "chicken", 1), (potato, "potato", 2)]);
        let b = product(vec![(chicken, "chicken", 2)]);
        let lines = [
            ProductQuantity { product_id: a.id, quantity: 3 },
            ProductQuantity { product_id: b.id, quantity: 1 },
            ProductQuantity { product_id: a.id, quantity: 1 },
        ];

        let usage = resolve_ingredient_usage(&lines, &catalog(&[a, b]), UnknownProductPolicy::Reject).unwrap();

        let by_id: HashMap<Uuid, Decimal> = usage.iter().map(|u| (u.ingredient_id, u.quantity)).collect();
        assert_eq!(by_id[&chicken], Decimal::from(6));
        assert_eq!(by_id[&potato], Decimal::from(8));
        assert!(usage.windows(2).all(|w| w[0].ingredient_id < w[1].ingredient_id));
    }

    #[test]
    fn products_without_recipe_contribute_nothing() {
        let soda = product(vec![]);
        let lines = [ProductQuantity { product_id: soda.id, quantity: 4 }];

        let usage = resolve_ingredient_usage(&lines, &catalog(&[soda]), UnknownProductPolicy::Reject).unwrap();
        assert!(usage.is_empty());
    }

    #[test]
    fn unknown_product_follows_policy() {
        let chicken = Uuid::new_v4();
        let known = product(vec![(chicken, "chicken", 1)]);
        let missing = Uuid::new_v4();
        let lines = [
            ProductQuantity { product_id: missing, quantity: 1 },
            ProductQuantity { product_id: known.id, quantity: 1 },
        ];
        let products = catalog(&[known]);

        let err = resolve_ingredient_usage(&lines, &products, UnknownProductPolicy::Reject).unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(id) if id == missing));

        let usage = resolve_ingredient_usage(&lines, &products, UnknownProductPolicy::Skip).unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].quantity, Decimal::ONE);
    }

    #[test]
    fn policy_parses_from_configuration_strings() {
        assert_eq!("Skip".parse::<UnknownProductPolicy>().unwrap(), UnknownProductPolicy::Skip);
        assert_eq!(" reject ".parse::<UnknownProductPolicy>().unwrap(), UnknownProductPolicy::Reject);
        assert!("ignore".parse::<UnknownProductPolicy>().is_err());
    }
}
