//! API Routes
//!
//! Route handlers organized by functionality.

pub mod figures;
pub mod health;
pub mod interact;
pub mod page;
pub mod refresh;
pub mod snapshot;
