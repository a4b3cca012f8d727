//! Endpoint definitions and the client that executes them.
//!
//! Every endpoint is a zero-sized type implementing [`Query`] (cached, tag
//! providing) or [`Mutation`] (uncached, tag invalidating). The
//! [`ApiClient`] runs both through the refresh coordinator and keeps the
//! query cache consistent.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod payments;
pub mod products;

pub use client::ApiClient;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache::Tag;
use crate::error::{ErrorInfo, SokoError};
use crate::http::{unwrap_envelope, RequestDescriptor};

/// Tag kinds shared by providers and invalidators.
pub mod tags {
    pub const USER: &str = "User";
    pub const PRODUCTS: &str = "Products";
    pub const PRODUCT: &str = "Product";
    pub const CATEGORIES: &str = "Categories";
    pub const BRANDS: &str = "Brands";
    pub const PAYMENT: &str = "Payment";
    pub const PAYMENT_METHODS: &str = "PaymentMethods";
}

/// A read-only endpoint whose results are cached.
pub trait Query {
    /// Cache namespace; unique per endpoint.
    const NAME: &'static str;

    type Args: Serialize + Send + Sync;
    type Output: Clone + Send + Sync + 'static;

    fn request(args: &Self::Args) -> Result<RequestDescriptor, SokoError>;

    fn transform(raw: Value) -> Result<Self::Output, SokoError>;

    fn provides_tags(_args: &Self::Args, _output: &Self::Output) -> Vec<Tag> {
        Vec::new()
    }
}

/// A write endpoint. Runs after local validation; on success invalidates
/// the cache entries matching its tags.
pub trait Mutation {
    const NAME: &'static str;

    type Args: Send + Sync;
    type Output: Send;

    fn request(args: &Self::Args) -> Result<RequestDescriptor, SokoError>;

    fn transform(raw: Value) -> Result<Self::Output, SokoError>;

    fn validate(_args: &Self::Args) -> Result<(), SokoError> {
        Ok(())
    }

    fn invalidates_tags(_args: &Self::Args, _output: &Self::Output) -> Vec<Tag> {
        Vec::new()
    }
}

/// Strip the envelope and deserialize.
pub(crate) fn decode<T: DeserializeOwned>(raw: Value) -> Result<T, SokoError> {
    Ok(serde_json::from_value(unwrap_envelope(raw))?)
}

/// Observable state of one cached query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    /// First fetch in flight, nothing to show yet.
    pub is_loading: bool,
    /// Any fetch in flight, including background refetches.
    pub is_fetching: bool,
    pub is_error: bool,
    pub error: Option<ErrorInfo>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fetching: false,
            is_error: false,
            error: None,
        }
    }
}
