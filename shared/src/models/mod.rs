//! Domain models for the weather safety advisor

mod alert;
mod condition;
mod equipment;
mod weather;

pub use alert::*;
pub use condition::*;
pub use equipment::*;
pub use weather::*;
