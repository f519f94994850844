// src/models/branch.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// A sucursal. Ingredientes, produtos, vendas e inventários apontam para ela
// por chave estrangeira; o CRUD simples fica fora deste serviço.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    pub name_branch: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resumo devolvido junto com um inventário consultado por id.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BranchSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&Branch> for BranchSummary {
    fn from(branch: &Branch) -> Self {
        Self { id: branch.id, name: branch.name_branch.clone() }
    }
}

/// Os nomes de sucursal são guardados em minúsculas.
pub fn normalize_branch_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_names_are_matched_case_insensitively() {
        assert_eq!(normalize_branch_name("  Central "), "central");
        assert_eq!(normalize_branch_name("SUR"), "sur");
    }
}
