// src/services/mod.rs

pub mod analytics;
pub mod exam;
pub mod recommendation;
pub mod sessions;
