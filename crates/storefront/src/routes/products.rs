//! Catalog route handlers.

use std::str::FromStr;

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
};
use milkrun_core::Product;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{AppError, MessageBody, Result};
use crate::state::AppState;

/// Message returned after a single product is added.
pub const PRODUCT_ADDED: &str = "✅ Product added successfully!";
/// Message returned after the catalog is replaced.
pub const PRODUCTS_SAVED: &str = "✅ Products saved successfully!";

/// Full catalog replacement request.
#[derive(Debug, Deserialize)]
pub struct ReplaceProductsRequest {
    pub products: Vec<Product>,
}

/// Response for a newly added product.
#[derive(Debug, Serialize)]
pub struct ProductAdded {
    pub message: String,
    pub product: Product,
}

/// List the catalog.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().load_all().await?;
    Ok(Json(products))
}

/// Replace the whole catalog.
///
/// POST /api/products
///
/// Products left out of the list are deleted.
#[instrument(skip(state, payload))]
pub async fn replace(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReplaceProductsRequest>, JsonRejection>,
) -> Result<Json<MessageBody>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    for product in &request.products {
        product
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    let count = request.products.len();
    state.catalog().replace_all(request.products).await?;
    info!(count, "Catalog replaced");

    Ok(Json(MessageBody {
        message: PRODUCTS_SAVED.to_string(),
    }))
}

/// Add one product, optionally with an image.
///
/// POST /api/add-product (multipart: `name`, `price`, `unit`, `image`)
///
/// The image is stored only after the text fields validate.
#[instrument(skip(state, multipart))]
pub async fn add(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductAdded>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let form = ProductForm::read(&mut multipart).await?;

    let mut product = Product::new(
        form.name.unwrap_or_default().trim(),
        parse_price(form.price.as_deref())?,
        form.unit.unwrap_or_default().trim(),
    );
    product
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if let Some(image) = form.image {
        product.image = state.uploads().save(&image.file_name, &image.bytes).await?;
    }

    if let Err(e) = state.catalog().append(product.clone()).await {
        if product.has_image() {
            state.uploads().remove(&product.image).await;
        }
        return Err(e.into());
    }
    info!(product = %product.name, has_image = product.has_image(), "Product added");

    Ok(Json(ProductAdded {
        message: PRODUCT_ADDED.to_string(),
        product,
    }))
}

/// Text fields and optional image of an add-product submission.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    price: Option<String>,
    unit: Option<String>,
    image: Option<ImagePart>,
}

#[derive(Debug)]
struct ImagePart {
    file_name: String,
    bytes: Bytes,
}

impl ProductForm {
    async fn read(multipart: &mut Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "name" | "price" | "unit" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    match field_name.as_str() {
                        "name" => form.name = Some(value),
                        "price" => form.price = Some(value),
                        _ => form.unit = Some(value),
                    }
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    // Browsers send an empty, unnamed part when no file was chosen
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.image = Some(ImagePart { file_name, bytes });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Parse the submitted price text.
fn parse_price(raw: Option<&str>) -> Result<Decimal> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::BadRequest("price is required".to_string()));
    }
    Decimal::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("price must be a number, got {raw:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some("80")).unwrap(), Decimal::from(80));
        assert_eq!(parse_price(Some(" 12.50 ")).unwrap(), Decimal::new(1250, 2));
    }

    #[test]
    fn test_parse_price_rejects_missing_and_garbage() {
        assert!(matches!(parse_price(None), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_price(Some("")), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_price(Some("eighty")),
            Err(AppError::BadRequest(_))
        ));
    }
}
