pub mod auth;
pub mod branch;
pub mod ingredient;
pub mod inventory;
pub mod product;
pub mod sale;
