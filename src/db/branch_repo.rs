// src/db/branch_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::branch::{normalize_branch_name, Branch},
};

// Só leitura: o cadastro de sucursais é feito por outro serviço.
#[derive(Clone)]
pub struct BranchRepository {
    pool: PgPool,
}

impl BranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_name<'e, E>(&self, executor: E, name_branch: &str) -> Result<Option<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE name_branch = $1")
            .bind(normalize_branch_name(name_branch))
            .fetch_optional(executor)
            .await?;
        Ok(branch)
    }

    /// Igual a `find_by_name`, mas a ausência vira `BranchNotFound`.
    pub async fn get_by_name<'e, E>(&self, executor: E, name_branch: &str) -> Result<Branch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.find_by_name(executor, name_branch)
            .await?
            .ok_or_else(|| AppError::BranchNotFound(name_branch.to_string()))
    }

    /// Atalho sem transação, usado nas consultas.
    pub async fn get_by_name_from_pool(&self, name_branch: &str) -> Result<Branch, AppError> {
        self.get_by_name(&self.pool, name_branch).await
    }
}
