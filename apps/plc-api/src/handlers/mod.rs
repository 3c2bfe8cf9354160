//! Handlers 模块

pub mod configurations;
pub mod health;
pub mod session;
pub mod sync;

pub use configurations::*;
pub use health::*;
pub use session::*;
pub use sync::*;
