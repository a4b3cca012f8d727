//! Convenience re-exports for common use.

pub use crate::api::{ApiClient, Mutation, Query, QueryState};
pub use crate::auth::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
pub use crate::cache::Tag;
pub use crate::config::SokoConfig;
pub use crate::error::{ErrorInfo, Result, SokoError};
pub use crate::payment::{PollEvent, PollOutcome, PollPolicy};
pub use crate::session::{Session, SessionEvent, SessionStatus};
pub use crate::types::{
    EntityId, LoginRequest, PaymentMethod, PaymentRecord, PaymentStatus, Product, ProductDraft,
    ProductFilter, ProductLineDraft, ProductPage, RegisterRequest, User,
};
pub use crate::validation::{Validate, ValidationErrors};
