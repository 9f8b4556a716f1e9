//! Core types for Inventory Live.
//!
//! This module provides type-safe wrappers for the inventory domain.

pub mod category;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod user;

pub use category::Category;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::Product;
pub use user::UserProfile;
