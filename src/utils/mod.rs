//! utils/mod.rs

pub mod json_parser;
pub mod security;
pub mod vector;
