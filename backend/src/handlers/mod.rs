//! HTTP handlers

pub mod alert;
pub mod health;
pub mod weather;

pub use alert::*;
pub use health::*;
pub use weather::*;
