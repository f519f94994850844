// src/handlers/inventory.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{Json, Path},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        branch::BranchSummary,
        inventory::{DailyInventory, IngredientStats, LedgerEmployee},
    },
};

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    #[validate(length(min = 1, message = "La CI del empleado es obligatoria."))]
    #[schema(example = "7845123")]
    pub employee_ci: String,

    #[validate(length(min = 1, message = "El nombre del empleado es obligatorio."))]
    #[schema(example = "María Quispe")]
    pub name: String,
}

impl From<EmployeePayload> for LedgerEmployee {
    fn from(p: EmployeePayload) -> Self {
        LedgerEmployee { employee_ci: p.employee_ci.trim().to_string(), name: p.name.trim().to_string() }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenInventoryPayload {
    #[validate(length(min = 1, message = "El nombre de la sucursal es obligatorio."))]
    #[schema(example = "central")]
    pub name_branch: String,

    #[serde(default)]
    #[validate(nested)]
    pub employees: Vec<EmployeePayload>,

    pub observations: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseInventoryPayload {
    #[validate(length(min = 1, message = "El nombre de la sucursal es obligatorio."))]
    #[schema(example = "central")]
    pub name_branch: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryPayload {
    #[validate(length(min = 1, message = "El nombre de la sucursal es obligatorio."))]
    pub name_branch: String,

    #[validate(nested)]
    pub employees: Option<Vec<EmployeePayload>>,

    pub observations: Option<String>,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryResponse {
    pub success: bool,
    pub message: String,
    pub inventory: DailyInventory,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryListResponse {
    pub success: bool,
    pub inventories: Vec<DailyInventory>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryWithBranchResponse {
    pub success: bool,
    pub message: String,
    pub inventory: DailyInventory,
    pub branch: BranchSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryStatsResponse {
    pub success: bool,
    pub stats: Vec<IngredientStats>,
}

fn parse_business_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("Fecha inválida: {} (formato AAAA-MM-DD)", raw)))
}

// ---
// Handlers
// ---

// POST /api/branch/inventory/addInventory
#[utoipa::path(
    post,
    path = "/api/branch/inventory/addInventory",
    tag = "Inventory",
    request_body = OpenInventoryPayload,
    responses(
        (status = 201, description = "Inventario del día abierto", body = InventoryResponse),
        (status = 404, description = "Sucursal inexistente"),
        (status = 409, description = "Ya existe inventario para hoy")
    ),
    security(("api_jwt" = []))
)]
pub async fn open_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<OpenInventoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.0.id, branch = %payload.name_branch, "Abrindo inventário");

    let employees = payload.employees.into_iter().map(LedgerEmployee::from).collect();
    let inventory = app_state
        .inventory_service
        .open_inventory(&payload.name_branch, employees, payload.observations)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(
        &locale.0,
        "inventory.opened",
        &[("branch", payload.name_branch.clone())],
    );

    Ok((StatusCode::CREATED, Json(InventoryResponse { success: true, message, inventory })))
}

// POST /api/branch/inventory/closeInventory
#[utoipa::path(
    post,
    path = "/api/branch/inventory/closeInventory",
    tag = "Inventory",
    request_body = CloseInventoryPayload,
    responses(
        (status = 200, description = "Inventario cerrado", body = InventoryResponse),
        (status = 404, description = "No hay inventario abierto hoy")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CloseInventoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.0.id, branch = %payload.name_branch, "Fechando inventário");

    let inventory = app_state
        .inventory_service
        .close_inventory(&payload.name_branch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "inventory.closed", &[]);
    Ok((StatusCode::OK, Json(InventoryResponse { success: true, message, inventory })))
}

// GET /api/branch/inventory/branch/{nameBranch}
#[utoipa::path(
    get,
    path = "/api/branch/inventory/branch/{nameBranch}",
    tag = "Inventory",
    params(("nameBranch" = String, Path, description = "Nombre de la sucursal")),
    responses((status = 200, description = "Inventarios de la sucursal", body = InventoryListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_by_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(name_branch): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let inventories = app_state
        .inventory_service
        .list_by_branch(&name_branch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(InventoryListResponse { success: true, inventories })))
}

// GET /api/branch/inventory/current/{nameBranch}
#[utoipa::path(
    get,
    path = "/api/branch/inventory/current/{nameBranch}",
    tag = "Inventory",
    params(("nameBranch" = String, Path, description = "Nombre de la sucursal")),
    responses(
        (status = 200, description = "Inventario de hoy", body = InventoryResponse),
        (status = 404, description = "Sin inventario hoy")
    ),
    security(("api_jwt" = []))
)]
pub async fn current(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(name_branch): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let inventory = app_state
        .inventory_service
        .current(&name_branch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "inventory.today", &[]);
    Ok((StatusCode::OK, Json(InventoryResponse { success: true, message, inventory })))
}

// GET /api/branch/inventory/date/{nameBranch}/{date}
#[utoipa::path(
    get,
    path = "/api/branch/inventory/date/{nameBranch}/{date}",
    tag = "Inventory",
    params(
        ("nameBranch" = String, Path, description = "Nombre de la sucursal"),
        ("date" = String, Path, description = "Día en formato AAAA-MM-DD")
    ),
    responses(
        (status = 200, description = "Inventario del día pedido", body = InventoryResponse),
        (status = 404, description = "Sin inventario ese día")
    ),
    security(("api_jwt" = []))
)]
pub async fn by_date(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((name_branch, date)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let business_date =
        parse_business_date(&date).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let inventory = app_state
        .inventory_service
        .by_date(&name_branch, business_date)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "inventory.fetched", &[]);
    Ok((StatusCode::OK, Json(InventoryResponse { success: true, message, inventory })))
}

// GET /api/branch/inventory/branch/{nameBranch}/{id}
#[utoipa::path(
    get,
    path = "/api/branch/inventory/branch/{nameBranch}/{id}",
    tag = "Inventory",
    params(
        ("nameBranch" = String, Path, description = "Nombre de la sucursal"),
        ("id" = Uuid, Path, description = "ID del inventario")
    ),
    responses(
        (status = 200, description = "Inventario", body = InventoryWithBranchResponse),
        (status = 404, description = "Inventario inexistente o de otra sucursal")
    ),
    security(("api_jwt" = []))
)]
pub async fn by_id(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((name_branch, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (inventory, branch) = app_state
        .inventory_service
        .by_id(&name_branch, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "inventory.fetched", &[]);
    Ok((
        StatusCode::OK,
        Json(InventoryWithBranchResponse {
            success: true,
            message,
            inventory,
            branch: BranchSummary::from(&branch),
        }),
    ))
}

// GET /api/branch/inventory/stats/{nameBranch}
#[utoipa::path(
    get,
    path = "/api/branch/inventory/stats/{nameBranch}",
    tag = "Inventory",
    params(("nameBranch" = String, Path, description = "Nombre de la sucursal")),
    responses((status = 200, description = "Estadísticas de los últimos 7 días", body = InventoryStatsResponse)),
    security(("api_jwt" = []))
)]
pub async fn stats(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(name_branch): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .inventory_service
        .stats(&name_branch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(InventoryStatsResponse { success: true, stats })))
}

// PUT /api/branch/inventory/update/{id}
#[utoipa::path(
    put,
    path = "/api/branch/inventory/update/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID del inventario")),
    request_body = UpdateInventoryPayload,
    responses(
        (status = 200, description = "Inventario actualizado", body = InventoryResponse),
        (status = 404, description = "Inventario inexistente o de otra sucursal")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.0.id, inventory_id = %id, "Atualizando inventário");

    let employees = payload
        .employees
        .map(|list| list.into_iter().map(LedgerEmployee::from).collect());
    let inventory = app_state
        .inventory_service
        .update_details(id, &payload.name_branch, employees, payload.observations)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "inventory.updated", &[]);
    Ok((StatusCode::OK, Json(InventoryResponse { success: true, message, inventory })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_date_accepts_iso_days_only() {
        assert_eq!(parse_business_date("2024-10-01").unwrap(), NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert!(matches!(parse_business_date("01/10/2024"), Err(AppError::InvalidInput(_))));
        assert!(parse_business_date("2024-02-30").is_err());
    }

    #[test]
    fn open_payload_validates_nested_employees() {
        let payload: OpenInventoryPayload = serde_json::from_value(serde_json::json!({
            "nameBranch": "central",
            "employees": [{ "employeeCi": "", "name": "Ana" }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: OpenInventoryPayload =
            serde_json::from_value(serde_json::json!({ "nameBranch": "central" })).unwrap();
        assert!(payload.validate().is_ok());
        assert!(payload.employees.is_empty());
    }

    #[test]
    fn employees_are_trimmed_into_the_ledger() {
        let employee = LedgerEmployee::from(EmployeePayload { employee_ci: " 123 ".into(), name: "Ana ".into() });
        assert_eq!(employee.employee_ci, "123");
        assert_eq!(employee.name, "Ana");
    }
}
