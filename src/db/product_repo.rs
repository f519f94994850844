// src/db/product_repo.rs

use std::collections::HashMap;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::product::{Product, RecipeLine},
};

// O catálogo de produtos é mantido por outro serviço; aqui só lemos preço e receita.
#[derive(Clone, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    /// Produtos pedidos, já com as linhas de receita, indexados por id.
    /// Ids inexistentes simplesmente não aparecem no mapa.
    pub async fn find_with_recipes(&self, conn: &mut PgConnection, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name_product, price FROM products WHERE id = ANY($1)",
        )
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;

        let lines = sqlx::query_as::<_, RecipeLine>(
            r#"
            SELECT product_id, ingredient_id, name, amount, unit
            FROM product_recipe_lines
            WHERE product_id = ANY($1)
            ORDER BY product_id, position
            "#,
        )
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;

        let mut by_id: HashMap<Uuid, Product> = products.into_iter().map(|p| (p.id, p)).collect();
        for line in lines {
            if let Some(product) = by_id.get_mut(&line.product_id) {
                product.recipe.push(line);
            }
        }
        Ok(by_id)
    }
}
