// src/handlers/ingredients.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{validate_not_negative, validate_stock_delta, validate_stock_level};
use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{Json, Path},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::ingredient::{Ingredient, IngredientUnit},
    services::inventory_service::StockAdjustment,
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIngredientPayload {
    #[validate(length(min = 1, message = "El nombre de la sucursal es obligatorio."))]
    #[schema(example = "central")]
    pub name_branch: String,

    #[validate(length(min = 1, message = "El nombre del ingrediente es obligatorio."))]
    #[schema(example = "pollo")]
    pub name: String,

    // Texto livre aqui; a conversão para o enum devolve `InvalidUnit`.
    #[schema(example = "kg")]
    pub unit: String,

    #[validate(custom(function = "validate_stock_level"))]
    #[schema(value_type = f64, example = 25.5)]
    pub current_stock: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(value_type = f64, example = 18.0)]
    pub cost: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIngredientPayload {
    #[validate(length(min = 1, message = "El nombre de la sucursal es obligatorio."))]
    pub name_branch: String,

    #[validate(length(min = 1, message = "El nombre no puede estar vacío."))]
    pub name: Option<String>,

    pub unit: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockPayload {
    #[validate(length(min = 1, message = "El nombre de la sucursal es obligatorio."))]
    #[schema(example = "central")]
    pub name_branch: String,

    pub ingredient_id: Uuid,

    /// Positivo = compra, negativo = ajuste.
    #[validate(custom(function = "validate_stock_delta"))]
    #[schema(value_type = f64, example = 20.0)]
    pub quantity: Decimal,

    pub observations: Option<String>,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub success: bool,
    pub message: String,
    pub ingredient: Ingredient,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientListResponse {
    pub success: bool,
    pub message: String,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockUpdateResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub adjustment: StockAdjustment,
}

fn parse_unit(raw: &str) -> Result<IngredientUnit, AppError> {
    raw.trim().to_lowercase().parse()
}

// ---
// Handlers
// ---

// POST /api/branch/ingredients/register
#[utoipa::path(
    post,
    path = "/api/branch/ingredients/register",
    tag = "Ingredients",
    request_body = RegisterIngredientPayload,
    responses(
        (status = 201, description = "Ingrediente registrado", body = IngredientResponse),
        (status = 400, description = "Unidad inválida o datos faltantes"),
        (status = 409, description = "Ya existe un ingrediente con ese nombre")
    ),
    security(("api_jwt" = []))
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<RegisterIngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    let unit = parse_unit(&payload.unit).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.0.id, branch = %payload.name_branch, "Registrando ingrediente");

    let ingredient = app_state
        .inventory_service
        .register_ingredient(&payload.name_branch, &payload.name, unit, payload.current_stock, payload.cost)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(
        &locale.0,
        "ingredient.registered",
        &[("branch", payload.name_branch.clone())],
    );
    Ok((StatusCode::CREATED, Json(IngredientResponse { success: true, message, ingredient })))
}

// GET /api/branch/ingredients/getIngredientsByBranch/{nameBranch}
#[utoipa::path(
    get,
    path = "/api/branch/ingredients/getIngredientsByBranch/{nameBranch}",
    tag = "Ingredients",
    params(("nameBranch" = String, Path, description = "Nombre de la sucursal")),
    responses((status = 200, description = "Ingredientes de la sucursal", body = IngredientListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_by_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(name_branch): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ingredients = app_state
        .inventory_service
        .list_ingredients(&name_branch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state
        .i18n_store
        .translate(&locale.0, "ingredient.listed", &[("branch", name_branch)]);
    Ok((StatusCode::OK, Json(IngredientListResponse { success: true, message, ingredients })))
}

// PUT /api/branch/ingredients/updateIngredient/{id}
#[utoipa::path(
    put,
    path = "/api/branch/ingredients/updateIngredient/{id}",
    tag = "Ingredients",
    params(("id" = Uuid, Path, description = "ID del ingrediente")),
    request_body = UpdateIngredientPayload,
    responses(
        (status = 200, description = "Ingrediente actualizado", body = IngredientResponse),
        (status = 404, description = "Ingrediente inexistente en la sucursal")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;
    let unit = payload
        .unit
        .as_deref()
        .map(parse_unit)
        .transpose()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let ingredient = app_state
        .inventory_service
        .update_ingredient(&payload.name_branch, id, payload.name.as_deref(), unit, payload.cost)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "ingredient.updated", &[]);
    Ok((StatusCode::OK, Json(IngredientResponse { success: true, message, ingredient })))
}

// POST /api/branch/ingredients/updateStock
#[utoipa::path(
    post,
    path = "/api/branch/ingredients/updateStock",
    tag = "Ingredients",
    request_body = UpdateStockPayload,
    responses(
        (status = 200, description = "Stock actualizado y movimiento registrado", body = StockUpdateResponse),
        (status = 400, description = "Sin inventario abierto o stock insuficiente"),
        (status = 404, description = "Ingrediente inexistente en la sucursal")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.0.id, ingredient_id = %payload.ingredient_id, "Ajustando estoque");

    let adjustment = app_state
        .inventory_service
        .adjust_stock(
            &payload.name_branch,
            payload.ingredient_id,
            payload.quantity,
            payload.observations.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "ingredient.stock_updated", &[]);
    Ok((StatusCode::OK, Json(StockUpdateResponse { success: true, message, adjustment })))
}
