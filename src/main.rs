//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o filtro; sem ele, `info`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let inventory_routes = Router::new()
        .route("/addInventory", post(handlers::inventory::open_inventory))
        .route("/closeInventory", post(handlers::inventory::close_inventory))
        .route("/branch/{nameBranch}", get(handlers::inventory::list_by_branch))
        .route("/branch/{nameBranch}/{id}", get(handlers::inventory::by_id))
        .route("/current/{nameBranch}", get(handlers::inventory::current))
        .route("/date/{nameBranch}/{date}", get(handlers::inventory::by_date))
        .route("/stats/{nameBranch}", get(handlers::inventory::stats))
        .route("/update/{id}", put(handlers::inventory::update));

    let ingredient_routes = Router::new()
        .route("/register", post(handlers::ingredients::register))
        .route(
            "/getIngredientsByBranch/{nameBranch}",
            get(handlers::ingredients::list_by_branch),
        )
        .route("/updateIngredient/{id}", put(handlers::ingredients::update))
        .route("/updateStock", post(handlers::ingredients::update_stock));

    let sale_routes = Router::new()
        .route("/addSale", post(handlers::sales::add_sale));

    // Tudo em /api/branch exige o token
    let branch_routes = Router::new()
        .nest("/inventory", inventory_routes)
        .nest("/ingredients", ingredient_routes)
        .nest("/sales", sale_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/branch", branch_routes)
        .with_state(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .context("Erro no servidor Axum")?;
    Ok(())
}
