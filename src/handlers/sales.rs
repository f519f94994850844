// src/handlers/sales.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validate_percentage;
use crate::{
    common::{
        error::{ApiError, AppError},
        extract::Json,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::{
        recipe::ProductQuantity,
        sale_service::{RegisteredSale, SaleRequest},
    },
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLinePayload {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "La cantidad debe ser al menos 1."))]
    #[schema(example = 2)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSalePayload {
    #[validate(length(min = 1, message = "El nombre de la sucursal es obligatorio."))]
    #[schema(example = "central")]
    pub name_branch: String,

    #[validate(length(min = 1, message = "El nombre del cliente es obligatorio."))]
    #[schema(example = "Juan Pérez")]
    pub client_name: String,

    #[serde(rename = "clientCI")]
    #[validate(length(min = 1, message = "La CI del cliente es obligatoria."))]
    #[schema(example = "4512378")]
    pub client_ci: String,

    #[validate(length(min = 1, message = "La venta debe tener al menos un producto."), nested)]
    pub products: Vec<SaleLinePayload>,

    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    #[schema(value_type = f64, example = 10.0)]
    pub discount: Decimal,
}

impl AddSalePayload {
    fn into_request(self) -> SaleRequest {
        SaleRequest {
            client_name: self.client_name,
            client_ci: self.client_ci,
            discount: self.discount,
            products: self
                .products
                .into_iter()
                .map(|line| ProductQuantity { product_id: line.product_id, quantity: line.quantity })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub registered: RegisteredSale,
}

// POST /api/branch/sales/addSale
#[utoipa::path(
    post,
    path = "/api/branch/sales/addSale",
    tag = "Sales",
    request_body = AddSalePayload,
    responses(
        (status = 200, description = "Venta registrada, stock descontado", body = SaleResponse),
        (status = 400, description = "Sin inventario abierto, stock insuficiente o producto inválido"),
        (status = 404, description = "Sucursal inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<AddSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.0.id, branch = %payload.name_branch, "Registrando venda");

    let name_branch = payload.name_branch.clone();
    let registered = app_state
        .sale_service
        .register_sale(&name_branch, payload.into_request())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state
        .i18n_store
        .translate(&locale.0, "sale.registered", &[("branch", name_branch)]);
    Ok((StatusCode::OK, Json(SaleResponse { success: true, message, registered })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(body: serde_json::Value) -> AddSalePayload {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn sale_needs_products_with_positive_quantities() {
        let empty = payload(serde_json::json!({
            "nameBranch": "central", "clientName": "Ana", "clientCI": "1", "products": []
        }));
        assert!(empty.validate().unwrap_err().field_errors().contains_key("products"));

        let zero = payload(serde_json::json!({
            "nameBranch": "central", "clientName": "Ana", "clientCI": "1",
            "products": [{ "productId": Uuid::new_v4(), "quantity": 0 }]
        }));
        assert!(zero.validate().is_err());
    }

    #[test]
    fn discount_defaults_to_zero_and_is_bounded() {
        let ok = payload(serde_json::json!({
            "nameBranch": "central", "clientName": "Ana", "clientCI": "1",
            "products": [{ "productId": Uuid::new_v4(), "quantity": 2 }]
        }));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.discount, Decimal::ZERO);

        let too_much = payload(serde_json::json!({
            "nameBranch": "central", "clientName": "Ana", "clientCI": "1",
            "products": [{ "productId": Uuid::new_v4(), "quantity": 2 }],
            "discount": 150
        }));
        assert!(too_much.validate().unwrap_err().field_errors().contains_key("discount"));
    }

    #[test]
    fn payload_becomes_service_request() {
        let product_id = Uuid::new_v4();
        let request = payload(serde_json::json!({
            "nameBranch": "central", "clientName": "Ana", "clientCI": "77",
            "products": [{ "productId": product_id, "quantity": 3 }],
            "discount": 5
        }))
        .into_request();

        assert_eq!(request.client_ci, "77");
        assert_eq!(request.products[0].product_id, product_id);
        assert_eq!(request.products[0].quantity, 3);
        assert_eq!(request.discount, Decimal::from(5));
    }
}
