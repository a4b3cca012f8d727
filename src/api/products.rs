//! Product catalogue endpoints.

use serde::Serialize;
use serde_json::Value;

use super::tags::{PRODUCT, PRODUCTS};
use super::{decode, ApiClient, Mutation, Query};
use crate::cache::Tag;
use crate::error::SokoError;
use crate::http::{unwrap_envelope, FormPart, RequestDescriptor};
use crate::types::{
    EntityId, FilterOptions as FilterOptionsData, OwnProductsFilter, Product, ProductDraft,
    ProductFilter, ProductPage, ProductUpdate,
};
use crate::validation::Validate;

pub const DEFAULT_RELATED_LIMIT: u32 = 4;
pub const DEFAULT_FEATURED_LIMIT: u32 = 8;

/// Decode a product list that may be a bare array or a
/// `{products, pagination}` object, with derived price ranges.
fn decode_page(raw: Value) -> Result<ProductPage, SokoError> {
    let mut page = match unwrap_envelope(raw) {
        list @ Value::Array(_) => ProductPage {
            products: serde_json::from_value(list)?,
            pagination: None,
        },
        Value::Object(map) if map.contains_key("products") => {
            serde_json::from_value(Value::Object(map))?
        }
        _ => ProductPage::default(),
    };
    page.products = page
        .products
        .into_iter()
        .map(Product::with_price_range)
        .collect();
    Ok(page)
}

fn decode_list(raw: Value) -> Result<Vec<Product>, SokoError> {
    Ok(decode_page(raw)?.products)
}

fn product_tags(products: &[Product]) -> Vec<Tag> {
    std::iter::once(Tag::kind(PRODUCTS))
        .chain(products.iter().map(|p| Tag::item(PRODUCT, p.id.clone())))
        .collect()
}

/// Multipart body of the product form. Nested fields use bracket keys such
/// as `product_lines[0][images][1][alt_text]`.
pub fn draft_form(draft: &ProductDraft) -> Vec<FormPart> {
    let mut parts = vec![
        FormPart::text("name", &draft.name),
        FormPart::text("description", &draft.description),
        FormPart::text("type", draft.product_type),
        FormPart::text("brand", &draft.brand),
        FormPart::text("category", &draft.category),
        FormPart::text("is_featured", draft.is_featured),
    ];
    for (i, line) in draft.product_lines.iter().enumerate() {
        let prefix = format!("product_lines[{i}]");
        parts.push(FormPart::text(format!("{prefix}[price]"), &line.price));
        parts.push(FormPart::text(
            format!("{prefix}[sale_price]"),
            line.sale_price.as_deref().unwrap_or_default(),
        ));
        parts.push(FormPart::text(format!("{prefix}[sku]"), &line.sku));
        parts.push(FormPart::text(format!("{prefix}[stock_qty]"), line.stock_qty));
        parts.push(FormPart::text(format!("{prefix}[is_active]"), line.is_active));
        for (j, image) in line.images.iter().enumerate() {
            let image_prefix = format!("{prefix}[images][{j}]");
            parts.push(FormPart::file(
                format!("{image_prefix}[image]"),
                &image.file_name,
                &image.mime,
                image.bytes.clone(),
            ));
            parts.push(FormPart::text(format!("{image_prefix}[alt_text]"), &image.alt_text));
            parts.push(FormPart::text(format!("{image_prefix}[is_primary]"), image.is_primary));
            parts.push(FormPart::text(format!("{image_prefix}[order]"), image.order));
        }
    }
    parts
}

pub struct ListProducts;

impl Query for ListProducts {
    const NAME: &'static str = "list_products";
    type Args = ProductFilter;
    type Output = ProductPage;

    fn request(args: &ProductFilter) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::get("/products/").query(args)
    }

    fn transform(raw: Value) -> Result<ProductPage, SokoError> {
        decode_page(raw)
    }

    fn provides_tags(_: &ProductFilter, page: &ProductPage) -> Vec<Tag> {
        product_tags(&page.products)
    }
}

pub struct GetProduct;

impl Query for GetProduct {
    const NAME: &'static str = "get_product";
    type Args = EntityId;
    type Output = Product;

    fn request(id: &EntityId) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::get(format!("/products/{id}")))
    }

    fn transform(raw: Value) -> Result<Product, SokoError> {
        Ok(decode::<Product>(raw)?.with_price_range())
    }

    fn provides_tags(id: &EntityId, _: &Product) -> Vec<Tag> {
        vec![Tag::item(PRODUCT, id.clone())]
    }
}

pub struct CreateProduct;

impl Mutation for CreateProduct {
    const NAME: &'static str = "create_product";
    type Args = ProductDraft;
    type Output = Value;

    fn request(draft: &ProductDraft) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::post("/products/").multipart(draft_form(draft)))
    }

    fn transform(raw: Value) -> Result<Value, SokoError> {
        Ok(unwrap_envelope(raw))
    }

    fn validate(draft: &ProductDraft) -> Result<(), SokoError> {
        draft.validate()
    }

    fn invalidates_tags(_: &ProductDraft, _: &Value) -> Vec<Tag> {
        vec![Tag::kind(PRODUCTS)]
    }
}

pub struct UpdateProduct;

impl Mutation for UpdateProduct {
    const NAME: &'static str = "update_product";
    type Args = ProductUpdate;
    type Output = Value;

    fn request(update: &ProductUpdate) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::put(format!("/products/{}", update.id))
            .multipart(draft_form(&update.draft)))
    }

    fn transform(raw: Value) -> Result<Value, SokoError> {
        Ok(unwrap_envelope(raw))
    }

    fn validate(update: &ProductUpdate) -> Result<(), SokoError> {
        update.draft.validate()
    }

    fn invalidates_tags(update: &ProductUpdate, _: &Value) -> Vec<Tag> {
        vec![Tag::kind(PRODUCTS), Tag::item(PRODUCT, update.id.clone())]
    }
}

pub struct DeleteProduct;

impl Mutation for DeleteProduct {
    const NAME: &'static str = "delete_product";
    type Args = EntityId;
    type Output = ();

    fn request(id: &EntityId) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::delete(format!("/products/{id}")))
    }

    fn transform(_: Value) -> Result<(), SokoError> {
        Ok(())
    }

    fn invalidates_tags(id: &EntityId, _: &()) -> Vec<Tag> {
        vec![Tag::kind(PRODUCTS), Tag::item(PRODUCT, id.clone())]
    }
}

pub struct OwnProducts;

impl Query for OwnProducts {
    const NAME: &'static str = "own_products";
    type Args = OwnProductsFilter;
    type Output = Vec<Product>;

    fn request(args: &OwnProductsFilter) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::get("/products/me/").query(args)
    }

    fn transform(raw: Value) -> Result<Vec<Product>, SokoError> {
        decode_list(raw)
    }

    fn provides_tags(_: &OwnProductsFilter, _: &Vec<Product>) -> Vec<Tag> {
        vec![Tag::kind(PRODUCTS)]
    }
}

pub struct FilterOptions;

impl Query for FilterOptions {
    const NAME: &'static str = "filter_options";
    type Args = ();
    type Output = FilterOptionsData;

    fn request(_: &()) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::get("/products/filter-options/"))
    }

    fn transform(raw: Value) -> Result<FilterOptionsData, SokoError> {
        let mut value = unwrap_envelope(raw);
        if let Value::Object(map) = &mut value {
            map.retain(|_, field| !field.is_null());
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedArgs {
    pub product_id: EntityId,
    pub limit: u32,
}

impl RelatedArgs {
    pub fn new(product_id: impl Into<EntityId>) -> Self {
        Self {
            product_id: product_id.into(),
            limit: DEFAULT_RELATED_LIMIT,
        }
    }
}

pub struct RelatedProducts;

impl Query for RelatedProducts {
    const NAME: &'static str = "related_products";
    type Args = RelatedArgs;
    type Output = Vec<Product>;

    fn request(args: &RelatedArgs) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::get(format!("/products/{}/related/", args.product_id))
            .query(&serde_json::json!({ "limit": args.limit }))
    }

    fn transform(raw: Value) -> Result<Vec<Product>, SokoError> {
        decode_list(raw)
    }

    fn provides_tags(args: &RelatedArgs, _: &Vec<Product>) -> Vec<Tag> {
        vec![Tag::item(PRODUCT, args.product_id.clone())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeaturedArgs {
    pub limit: u32,
}

impl Default for FeaturedArgs {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEATURED_LIMIT,
        }
    }
}

pub struct FeaturedProducts;

impl Query for FeaturedProducts {
    const NAME: &'static str = "featured_products";
    type Args = FeaturedArgs;
    type Output = Vec<Product>;

    fn request(args: &FeaturedArgs) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::get("/products/featured/").query(args)
    }

    fn transform(raw: Value) -> Result<Vec<Product>, SokoError> {
        decode_list(raw)
    }

    fn provides_tags(_: &FeaturedArgs, _: &Vec<Product>) -> Vec<Tag> {
        vec![Tag::kind(PRODUCTS)]
    }
}

impl ApiClient {
    pub async fn products(&self, filter: &ProductFilter) -> Result<ProductPage, SokoError> {
        self.query::<ListProducts>(filter).await
    }

    pub async fn product(&self, id: impl Into<EntityId>) -> Result<Product, SokoError> {
        self.query::<GetProduct>(&id.into()).await
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Value, SokoError> {
        self.mutate::<CreateProduct>(draft).await
    }

    pub async fn update_product(&self, update: &ProductUpdate) -> Result<Value, SokoError> {
        self.mutate::<UpdateProduct>(update).await
    }

    pub async fn delete_product(&self, id: impl Into<EntityId>) -> Result<(), SokoError> {
        self.mutate::<DeleteProduct>(&id.into()).await
    }

    pub async fn own_products(&self, filter: &OwnProductsFilter) -> Result<Vec<Product>, SokoError> {
        self.query::<OwnProducts>(filter).await
    }

    pub async fn filter_options(&self) -> Result<FilterOptionsData, SokoError> {
        self.query::<FilterOptions>(&()).await
    }

    pub async fn related_products(&self, args: &RelatedArgs) -> Result<Vec<Product>, SokoError> {
        self.query::<RelatedProducts>(args).await
    }

    pub async fn featured_products(&self, limit: Option<u32>) -> Result<Vec<Product>, SokoError> {
        let args = limit.map(|limit| FeaturedArgs { limit }).unwrap_or_default();
        self.query::<FeaturedProducts>(&args).await
    }
}
