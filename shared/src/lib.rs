//! Weather risk classification and safety-equipment advisory engine
//!
//! This crate holds everything that decides: metric bands, hazard rules,
//! equipment advisories, reading validation and the alert lifecycle. It is
//! shared by the backend service and the browser (via WASM) and does no I/O.

pub mod advisory;
pub mod classify;
pub mod conditions;
pub mod models;
pub mod types;
pub mod validation;

pub use advisory::*;
pub use classify::*;
pub use conditions::*;
pub use models::*;
pub use types::*;
pub use validation::*;
