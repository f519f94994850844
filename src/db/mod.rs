// src/db/mod.rs

pub mod branch_repo;
pub mod ingredient_repo;
pub mod inventory_repo;
pub mod product_repo;
pub mod sale_repo;

pub use branch_repo::BranchRepository;
pub use ingredient_repo::IngredientRepository;
pub use inventory_repo::InventoryRepository;
pub use product_repo::ProductRepository;
pub use sale_repo::SaleRepository;
