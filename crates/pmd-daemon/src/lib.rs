//! pmd-daemon library surface: router construction and shared state, split
//! out of `main.rs` so the scenario tests can drive the HTTP surface
//! in-process.

pub mod api_types;
pub mod routes;
pub mod state;
