//! Inventory Live Core - Shared types and client-side logic.
//!
//! This crate holds everything the inventory client decides without talking
//! to the network:
//! - product records and their wire formats
//! - the live event model and the store that reconciles it
//! - search filtering and form validation
//!
//! # Architecture
//!
//! No I/O lives here. The `inventory-client` crate owns HTTP and the live
//! socket and feeds this crate's types.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, categories and products
//! - [`event`] - Live channel frames
//! - [`store`] - Ordered product store and event reconciliation
//! - [`search`] / [`view`] - Query filtering over the store
//! - [`channel`] - Live channel status machine
//! - [`form`] - Form validation and per-field errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod channel;
pub mod event;
pub mod form;
pub mod search;
pub mod store;
pub mod types;
pub mod view;

pub use channel::{ChannelSignal, ChannelStatus};
pub use event::{EventParseError, LiveEvent};
pub use form::{FieldErrors, FormError};
pub use search::filter_products;
pub use store::ProductStore;
pub use types::*;
pub use view::ProductView;
