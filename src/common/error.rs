// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    common::i18n::{I18nStore, DEFAULT_LANG},
    middleware::i18n::Locale,
    models::ingredient::IngredientUnit,
};

// O tipo de erro da aplicação. Os serviços só devolvem `AppError`;
// a conversão para resposta HTTP acontece na borda, em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Unidade de medida inválida: {0}")]
    InvalidUnit(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Sucursal não encontrada: {0}")]
    BranchNotFound(String),

    #[error("Ingrediente não encontrado")]
    IngredientNotFound,

    #[error("Inventário não encontrado")]
    InventoryNotFound,

    #[error("O inventário não pertence à sucursal")]
    InventoryNotInBranch,

    #[error("Já existe inventário para hoje nesta sucursal")]
    InventoryAlreadyExists,

    #[error("Não há inventário aberto para hoje")]
    NoOpenInventory,

    #[error("O inventário já está fechado")]
    InventoryClosed,

    #[error("Ingrediente {0} fora do inventário do dia")]
    IngredientNotInInventory(String),

    #[error("Nenhum ingrediente rastreável nos produtos")]
    NoTrackableIngredients,

    #[error("Estoque insuficiente de {ingredient}: {current_stock} {unit}")]
    InsufficientStock {
        ingredient: String,
        current_stock: Decimal,
        unit: IngredientUnit,
    },

    #[error("Referência inválida: {0}")]
    InvalidReference(Uuid),

    #[error("Ingrediente já existe: {0}")]
    IngredientNameAlreadyExists(String),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

/// Resposta de erro já traduzida: `{ success: false, message, error? }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "message": self.message,
        });
        if let Some(error) = self.error {
            body["error"] = error;
        }
        (self.status, Json(body)).into_response()
    }
}

// Para rejeições de extratores, onde não temos o idioma nem o catálogo do estado.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale(DEFAULT_LANG.to_string()), &I18nStore::new())
            .into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidUnit(_)
            | AppError::NoOpenInventory
            | AppError::InventoryClosed
            | AppError::IngredientNotInInventory(_)
            | AppError::NoTrackableIngredients
            | AppError::InsufficientStock { .. }
            | AppError::InvalidReference(_) => StatusCode::BAD_REQUEST,

            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::BranchNotFound(_)
            | AppError::IngredientNotFound
            | AppError::InventoryNotFound
            | AppError::InventoryNotInBranch => StatusCode::NOT_FOUND,

            AppError::InventoryAlreadyExists | AppError::IngredientNameAlreadyExists(_) => {
                StatusCode::CONFLICT
            }

            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Chave do catálogo de mensagens e os argumentos para interpolar.
    fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => ("error.validation", vec![]),
            AppError::InvalidInput(_) => ("error.invalid_input", vec![]),
            AppError::InvalidUnit(unit) => ("error.invalid_unit", vec![("unit", unit.clone())]),
            AppError::InvalidToken | AppError::JwtError(_) => ("error.invalid_token", vec![]),
            AppError::BranchNotFound(_) => ("error.branch_not_found", vec![]),
            AppError::IngredientNotFound => ("error.ingredient_not_found", vec![]),
            AppError::InventoryNotFound => ("error.inventory_not_found", vec![]),
            AppError::InventoryNotInBranch => ("error.inventory_not_in_branch", vec![]),
            AppError::InventoryAlreadyExists => ("error.inventory_already_exists", vec![]),
            AppError::NoOpenInventory => ("error.no_open_inventory", vec![]),
            AppError::InventoryClosed => ("error.inventory_closed", vec![]),
            AppError::IngredientNotInInventory(name) => {
                ("error.ingredient_not_in_inventory", vec![("name", name.clone())])
            }
            AppError::NoTrackableIngredients => ("error.no_trackable_ingredients", vec![]),
            AppError::InsufficientStock { ingredient, current_stock, unit } => (
                "error.insufficient_stock",
                vec![
                    ("name", ingredient.clone()),
                    ("stock", current_stock.normalize().to_string()),
                    ("unit", unit.to_string()),
                ],
            ),
            AppError::InvalidReference(id) => ("error.invalid_reference", vec![("id", id.to_string())]),
            AppError::IngredientNameAlreadyExists(name) => {
                ("error.ingredient_name_exists", vec![("name", name.clone())])
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => ("error.internal", vec![]),
        }
    }

    /// Detalhe opcional para o campo `error` da resposta.
    fn detail(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::InvalidInput(detail) => Some(json!(detail)),
            AppError::InsufficientStock { ingredient, current_stock, unit } => Some(json!({
                "ingredient": ingredient,
                "currentStock": current_stock,
                "unit": unit,
            })),
            _ => None,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();
        if status.is_server_error() {
            // O detalhe fica só no log.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (key, args) = self.message_key();
        ApiError {
            status,
            message: store.translate(&locale.0, key, &args),
            error: self.detail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es() -> Locale {
        Locale("es".into())
    }

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(AppError::BranchNotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InventoryAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoOpenInventory.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InventoryNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InventoryNotInBranch.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn insufficient_stock_names_ingredient_and_remaining_quantity() {
        let err = AppError::InsufficientStock {
            ingredient: "chicken".into(),
            current_stock: Decimal::new(4000, 3),
            unit: IngredientUnit::Kg,
        };
        let api = err.to_api_error(&es(), &I18nStore::new());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.message, "Stock insuficiente de chicken. Stock actual: 4 kg");
        let detail = api.error.unwrap();
        assert_eq!(detail["ingredient"], "chicken");
        assert_eq!(detail["unit"], "kg");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco"));
        let api = err.to_api_error(&es(), &I18nStore::new());
        assert!(!api.message.contains("senha"));
        assert!(api.error.is_none());
    }

    #[test]
    fn validation_errors_list_field_messages() {
        let mut errors = validator::ValidationErrors::new();
        let mut e = validator::ValidationError::new("range");
        e.message = Some("La cantidad no puede ser cero.".into());
        errors.add("quantity", e);

        let api = AppError::ValidationError(errors).to_api_error(&es(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error.unwrap()["quantity"][0], "La cantidad no puede ser cero.");
    }
}
