// src/handlers/mod.rs

pub mod analytics;
pub mod auth;
pub mod health;
pub mod profile;
pub mod quiz;
pub mod recommendations;
