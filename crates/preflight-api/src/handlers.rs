//! Request handlers.

pub mod analysis;
pub mod health;
pub mod webhook;

pub use analysis::*;
pub use health::*;
pub use webhook::*;
