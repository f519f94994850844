// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{BranchRepository, IngredientRepository, InventoryRepository, ProductRepository, SaleRepository},
    services::{
        inventory_service::InventoryService, recipe::UnknownProductPolicy, sale_service::SaleService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida uma única vez na inicialização e passada ao `AppState`.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub unknown_product_policy: UnknownProductPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave→valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {}", raw))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let unknown_product_policy = match lookup("UNKNOWN_PRODUCT_POLICY") {
            Some(raw) => raw.parse()?,
            None => UnknownProductPolicy::default(),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            max_connections,
            unknown_product_policy,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: I18nStore,
    pub inventory_service: InventoryService,
    pub sale_service: SaleService,
}

// Os extratores de `common::extract` só precisam do catálogo.
impl FromRef<AppState> for I18nStore {
    fn from_ref(state: &AppState) -> Self {
        state.i18n_store.clone()
    }
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let branch_repo = BranchRepository::new(db_pool.clone());
        let ingredient_repo = IngredientRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new();
        let sale_repo = SaleRepository::new();

        let inventory_service = InventoryService::new(
            branch_repo.clone(),
            ingredient_repo.clone(),
            inventory_repo.clone(),
            db_pool.clone(),
        );
        let sale_service = SaleService::new(
            branch_repo,
            ingredient_repo,
            inventory_repo,
            product_repo,
            sale_repo,
            config.unknown_product_policy,
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: I18nStore::new(),
            inventory_service,
            sale_service,
        })
    }
}
