// src/models/mod.rs

pub mod attempt;
pub mod exam_record;
pub mod question;
pub mod report;
pub mod student;
