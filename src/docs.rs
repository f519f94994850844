// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Inventory ---
        handlers::inventory::open_inventory,
        handlers::inventory::close_inventory,
        handlers::inventory::list_by_branch,
        handlers::inventory::current,
        handlers::inventory::by_date,
        handlers::inventory::by_id,
        handlers::inventory::stats,
        handlers::inventory::update,

        // --- Ingredients ---
        handlers::ingredients::register,
        handlers::ingredients::list_by_branch,
        handlers::ingredients::update,
        handlers::ingredients::update_stock,

        // --- Sales ---
        handlers::sales::add_sale,
    ),
    components(
        schemas(
            // --- Models ---
            models::branch::BranchSummary,
            models::ingredient::IngredientUnit,
            models::ingredient::Ingredient,
            models::inventory::InventoryStatus,
            models::inventory::MovementType,
            models::inventory::LedgerEmployee,
            models::inventory::InventoryMovement,
            models::inventory::LedgerIngredient,
            models::inventory::DailyInventory,
            models::inventory::IngredientStats,
            models::sale::IngredientUsage,
            models::sale::ProcessedSaleIngredients,
            models::sale::SaleProduct,
            models::sale::Sale,
            services::inventory_service::StockAdjustment,
            services::sale_service::RegisteredSale,

            // --- Payloads ---
            handlers::inventory::EmployeePayload,
            handlers::inventory::OpenInventoryPayload,
            handlers::inventory::CloseInventoryPayload,
            handlers::inventory::UpdateInventoryPayload,
            handlers::ingredients::RegisterIngredientPayload,
            handlers::ingredients::UpdateIngredientPayload,
            handlers::ingredients::UpdateStockPayload,
            handlers::sales::SaleLinePayload,
            handlers::sales::AddSalePayload,

            // --- Respostas ---
            handlers::inventory::InventoryResponse,
            handlers::inventory::InventoryListResponse,
            handlers::inventory::InventoryWithBranchResponse,
            handlers::inventory::InventoryStatsResponse,
            handlers::ingredients::IngredientResponse,
            handlers::ingredients::IngredientListResponse,
            handlers::ingredients::StockUpdateResponse,
            handlers::sales::SaleResponse,
        )
    ),
    tags(
        (name = "Inventory", description = "Inventario diario por sucursal (apertura, cierre, consultas)"),
        (name = "Ingredients", description = "Ingredientes de la sucursal y ajustes de stock"),
        (name = "Sales", description = "Ventas con descuento automático de ingredientes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented_with_bearer_security() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/branch/inventory/addInventory",
            "/api/branch/inventory/closeInventory",
            "/api/branch/inventory/date/{nameBranch}/{date}",
            "/api/branch/ingredients/updateStock",
            "/api/branch/sales/addSale",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota sem documentação: {}", path);
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
