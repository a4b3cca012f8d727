//! Soko — marketplace API client
//!
//! Authenticated access to the Soko marketplace backend: token persistence
//! with transparent refresh, a tag-invalidated query cache, an observable
//! session, and payment status polling.
//!
//! # Quick Start
//!
//! ```no_run
//! use soko::prelude::*;
//!
//! # async fn example() -> soko::error::Result<()> {
//! let client = ApiClient::new(SokoConfig::from_env()?)?;
//! client.login(&LoginRequest::new("asha@example.com", "Secret#123")).await?;
//!
//! let page = client.products(&ProductFilter::builder().search("kanga").build()).await?;
//! for product in &page.products {
//!     println!("{} ({} - {})", product.name, product.price_range.min, product.price_range.max);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod payment;
pub mod prelude;
pub mod session;
pub mod types;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;
