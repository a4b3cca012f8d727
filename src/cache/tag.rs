use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::SokoError;
use crate::types::EntityId;

/// Labels linking cached query results to the mutations that stale them.
///
/// A tag without an id (`Products`) is a collection tag; with an id
/// (`Product:42`) it names one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    kind: &'static str,
    id: Option<EntityId>,
}

impl Tag {
    pub const fn kind(kind: &'static str) -> Self {
        Self { kind, id: None }
    }

    pub fn item(kind: &'static str, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind
    }

    pub fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    /// Whether invalidating `self` stales an entry that provided `provided`.
    pub fn invalidates(&self, provided: &Tag) -> bool {
        if self.kind != provided.kind {
            return false;
        }
        match &self.id {
            None => true,
            Some(id) => provided.id.as_ref() == Some(id),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => f.write_str(self.kind),
        }
    }
}

/// Identity of a cached query: endpoint name plus a digest of its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: &'static str,
    args_digest: String,
}

impl CacheKey {
    pub fn new<A: Serialize + ?Sized>(endpoint: &'static str, args: &A) -> Result<Self, SokoError> {
        let encoded = serde_json::to_vec(args)?;
        let digest = Sha256::digest(&encoded);
        let args_digest = digest.iter().map(|b| format!("{b:02x}")).collect();
        Ok(Self {
            endpoint,
            args_digest,
        })
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, &self.args_digest[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_tag_invalidates_every_item_of_its_kind() {
        let products = Tag::kind("Products");
        assert!(products.invalidates(&Tag::kind("Products")));
        assert!(!products.invalidates(&Tag::item("Product", 1_i64)));

        let product = Tag::kind("Product");
        assert!(product.invalidates(&Tag::item("Product", 1_i64)));
        assert!(product.invalidates(&Tag::item("Product", 2_i64)));
    }

    #[test]
    fn item_tag_requires_matching_id() {
        let tag = Tag::item("Product", 1_i64);
        assert!(tag.invalidates(&Tag::item("Product", "1")));
        assert!(!tag.invalidates(&Tag::item("Product", 2_i64)));
        assert!(!tag.invalidates(&Tag::kind("Product")));
    }

    #[test]
    fn keys_depend_on_endpoint_and_args() {
        let a = CacheKey::new("list_products", &json!({"page": 1})).unwrap();
        let b = CacheKey::new("list_products", &json!({"page": 1})).unwrap();
        let c = CacheKey::new("list_products", &json!({"page": 2})).unwrap();
        let d = CacheKey::new("own_products", &json!({"page": 1})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(a.to_string().starts_with("list_products("));
    }

    #[test]
    fn tags_render_kind_and_id() {
        assert_eq!(Tag::item("Payment", "p-1").to_string(), "Payment:p-1");
        assert_eq!(Tag::kind("User").to_string(), "User");
    }
}
