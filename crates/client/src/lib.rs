//! Inventory Live Client - REST and live channel access.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`api`] - Typed REST client for auth and product endpoints
//! - [`session`] - Session context, persistence, login and logout flows
//! - [`live`] - Websocket channel and the live feed coordinator
//! - [`error`] - Error type and its surfacing taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod live;
pub mod session;

pub use api::{ApiClient, ImageUpload, ProductOrder, ProductQuery};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ErrorKind};
pub use live::{FeedInput, FeedUpdate, Listing, LiveChannel, LiveFeed};
pub use session::{Session, SessionStore};
