//! tests/mod.rs
mod support;

mod catalog_tests;
mod realtime_tests;
