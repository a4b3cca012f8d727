use serde_json::Value;

use super::tags::{BRANDS, CATEGORIES};
use super::{decode, ApiClient, Query};
use crate::cache::Tag;
use crate::error::SokoError;
use crate::http::RequestDescriptor;
use crate::types::{Brand, Category};

pub struct Categories;

impl Query for Categories {
    const NAME: &'static str = "categories";
    type Args = ();
    type Output = Vec<Category>;

    fn request(_: &()) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::get("/categories/"))
    }

    fn transform(raw: Value) -> Result<Vec<Category>, SokoError> {
        decode(raw)
    }

    fn provides_tags(_: &(), _: &Vec<Category>) -> Vec<Tag> {
        vec![Tag::kind(CATEGORIES)]
    }
}

pub struct Brands;

impl Query for Brands {
    const NAME: &'static str = "brands";
    type Args = ();
    type Output = Vec<Brand>;

    fn request(_: &()) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::get("/brands/"))
    }

    fn transform(raw: Value) -> Result<Vec<Brand>, SokoError> {
        decode(raw)
    }

    fn provides_tags(_: &(), _: &Vec<Brand>) -> Vec<Tag> {
        vec![Tag::kind(BRANDS)]
    }
}

impl ApiClient {
    pub async fn categories(&self) -> Result<Vec<Category>, SokoError> {
        self.query::<Categories>(&()).await
    }

    pub async fn brands(&self) -> Result<Vec<Brand>, SokoError> {
        self.query::<Brands>(&()).await
    }
}
