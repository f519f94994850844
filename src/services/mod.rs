// src/services/mod.rs

pub mod inventory_service;
pub mod recipe;
pub mod sale_service;
