//! Code128 barcode images for product labels

use barcoders::generators::image::Image;
use barcoders::sym::code128::Code128;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use shared::Product;

use crate::error::{AppError, AppResult};

/// Character-set B prefix: printable ASCII, upper and lower case.
const CHARSET_B: char = 'Ɓ';

const IMAGE_HEIGHT: u32 = 80;

/// Render `code` as a Code128 PNG, base64 encoded.
pub fn barcode_png(code: &str) -> AppResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::validation("barcode", "Barcode is empty"));
    }

    let symbol = Code128::new(format!("{CHARSET_B}{code}"))
        .map_err(|e| AppError::validation("barcode", format!("Cannot encode barcode: {e}")))?;
    let png = Image::png(IMAGE_HEIGHT)
        .generate(&symbol.encode()[..])
        .map_err(|e| AppError::Internal(format!("Barcode image generation failed: {e}")))?;

    Ok(BASE64.encode(png))
}

/// A product as the API returns it, with its label image when it has a barcode.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub barcode_png: Option<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let barcode_png = product.barcode.as_deref().and_then(|code| {
            barcode_png(code)
                .map_err(|e| {
                    tracing::warn!(product_id = %product.id, error = %e, "Failed to render barcode");
                })
                .ok()
        });
        Self { product, barcode_png }
    }
}
