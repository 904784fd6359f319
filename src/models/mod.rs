// src/models/mod.rs

pub mod blueprint;
pub mod exam_result;
pub mod metadata;
pub mod question;
