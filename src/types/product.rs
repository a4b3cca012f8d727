use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::{decimal_string, EntityId};

/// Min/max of a product's current line prices, derived client-side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Compute the range over each line's `current_price`.
    ///
    /// Unparseable prices count as `0`, and an empty line list yields `0..0`.
    pub fn from_lines(lines: &[ProductLine]) -> Self {
        let prices: Vec<f64> = lines
            .iter()
            .map(|line| {
                line.current_price
                    .as_deref()
                    .and_then(|raw| raw.trim().parse::<f64>().ok())
                    .filter(|price| price.is_finite())
                    .unwrap_or(0.0)
            })
            .collect();
        if prices.is_empty() {
            return Self::default();
        }
        Self {
            min: prices.iter().copied().fold(f64::INFINITY, f64::min),
            max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

fn default_filter_price_range() -> PriceRange {
    PriceRange {
        min: 0.0,
        max: 1000.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub image: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub order: u32,
}

/// A purchasable variant (SKU) of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default, deserialize_with = "decimal_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "decimal_string")]
    pub sale_price: Option<String>,
    #[serde(default, deserialize_with = "decimal_string")]
    pub current_price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock_qty: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub product_type: Option<String>,
    /// Either a brand id or an embedded brand object, depending on the endpoint.
    #[serde(default)]
    pub brand: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub product_lines: Vec<ProductLine>,
    #[serde(default)]
    pub price_range: PriceRange,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Recompute `price_range` from the product lines.
    pub fn with_price_range(mut self) -> Self {
        self.price_range = PriceRange::from_lines(&self.product_lines);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters of `GET /products/`. Unset fields are not sent.
///
/// ```
/// use soko::types::ProductFilter;
///
/// let filter = ProductFilter::builder().search("kanga").page(2).build();
/// assert_eq!(filter.search.as_deref(), Some("kanga"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
pub struct ProductFilter {
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Query parameters of `GET /products/me/`.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
pub struct OwnProductsFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: EntityId,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Facets offered by the search sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub brands: Vec<Brand>,
    #[serde(default = "default_filter_price_range")]
    pub price_range: PriceRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductType {
    #[default]
    Physical,
    Digital,
}

/// An image file attached to a product line before upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub alt_text: String,
    pub is_primary: bool,
    pub order: u32,
}

impl ImageUpload {
    /// Guess the MIME type from the file extension, defaulting to
    /// `application/octet-stream`.
    pub fn guess_mime(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// A product line as entered in the seller dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductLineDraft {
    pub price: String,
    pub sale_price: Option<String>,
    pub sku: String,
    pub stock_qty: u32,
    pub is_active: bool,
    pub images: Vec<ImageUpload>,
}

impl ProductLineDraft {
    /// Attach an image. The first image becomes primary; order follows
    /// insertion.
    pub fn add_image(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) {
        let file_name = file_name.into();
        let order = self.images.len() as u32;
        self.images.push(ImageUpload {
            mime: ImageUpload::guess_mime(&file_name).to_string(),
            alt_text: file_name.clone(),
            file_name,
            bytes,
            is_primary: order == 0,
            order,
        });
    }

    /// Make the image at `index` the only primary image.
    pub fn set_primary_image(&mut self, index: usize) {
        for (idx, image) in self.images.iter_mut().enumerate() {
            image.is_primary = idx == index;
        }
    }

    pub fn remove_image(&mut self, index: usize) -> Option<ImageUpload> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }
}

/// Product create/update form, uploaded as multipart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub product_type: ProductType,
    pub brand: String,
    pub category: String,
    pub is_featured: bool,
    pub product_lines: Vec<ProductLineDraft>,
}

/// Arguments of the product update mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub id: EntityId,
    pub draft: ProductDraft,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(price: Option<&str>) -> ProductLine {
        ProductLine {
            id: None,
            price: None,
            sale_price: None,
            current_price: price.map(str::to_string),
            sku: None,
            stock_qty: None,
            is_active: true,
            images: Vec::new(),
        }
    }

    #[test]
    fn price_range_spans_current_prices() {
        let range = PriceRange::from_lines(&[line(Some("15000.00")), line(Some("2500"))]);
        assert_eq!(range, PriceRange { min: 2500.0, max: 15000.0 });
    }

    #[test]
    fn price_range_counts_unparseable_prices_as_zero() {
        let range = PriceRange::from_lines(&[line(Some("n/a")), line(Some("40"))]);
        assert_eq!(range, PriceRange { min: 0.0, max: 40.0 });
        assert_eq!(PriceRange::from_lines(&[]), PriceRange::default());
    }

    #[test]
    fn product_line_accepts_numeric_prices() {
        let parsed: ProductLine =
            serde_json::from_value(json!({"current_price": 99.5, "sku": "A-1"})).unwrap();
        assert_eq!(parsed.current_price.as_deref(), Some("99.5"));
        assert!(parsed.is_active);
    }

    #[test]
    fn filter_options_default_price_range() {
        let options: FilterOptions = serde_json::from_value(json!({})).unwrap();
        assert!(options.categories.is_empty());
        assert_eq!(options.price_range, PriceRange { min: 0.0, max: 1000.0 });
    }

    #[test]
    fn first_image_becomes_primary() {
        let mut draft = ProductLineDraft::default();
        draft.add_image("front.PNG", vec![1]);
        draft.add_image("back.jpg", vec![2]);
        assert!(draft.images[0].is_primary);
        assert!(!draft.images[1].is_primary);
        assert_eq!(draft.images[0].mime, "image/png");
        assert_eq!(draft.images[1].order, 1);

        draft.set_primary_image(1);
        assert!(!draft.images[0].is_primary);
        assert!(draft.images[1].is_primary);
        assert!(draft.remove_image(5).is_none());
    }
}
