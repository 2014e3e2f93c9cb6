//! Row-to-advertisement transformation.
//!
//! Everything here is a pure function of the fetched row plus the category,
//! so the business rules (bedroom defaults, headline shapes, URL synthesis)
//! are unit-testable without a store or a filesystem.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::ExportError;
use crate::advert::{Advert, ImageUrls};
use crate::category::Category;
use crate::storage::ListingRow;

/// Normalize free text into a URL-safe, hyphen-joined lowercase token
/// sequence: lowercase, treat every run of non-alphanumerics as a single
/// separator, join the remaining words with hyphens.
///
/// Idempotent: hyphens are themselves separators, so re-slugifying a slug
/// reproduces it.
pub fn slugify(input: &str) -> String {
    input
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Uppercase the first letter of each whitespace-separated word, leaving
/// the rest of the word untouched.
fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bedroom and bathroom counts after category normalization.
///
/// Commercial categories always carry (0, 0) regardless of source values.
/// Residential rows with a present-and-zero bedroom count are billed as
/// one-bed one-bath; an absent count stays zero so the serializer omits it.
pub fn normalized_rooms(
    category: Category,
    bed: Option<i64>,
    bathroom: Option<i64>,
) -> (i64, i64) {
    if category.is_commercial() {
        return (0, 0);
    }
    match bed {
        Some(0) => (1, 1),
        Some(n) => (n, bathroom.unwrap_or(0)),
        None => (0, bathroom.unwrap_or(0)),
    }
}

/// Build the advert headline from the category, the property type, and the
/// bedroom count *as stored* (before normalization).
///
/// Residential: `"{N} bedroom {type} {for sale|to let}"`, where `{N}` is
/// "Studio" when the stored count was zero or absent; type "land" drops the
/// bedroom prefix entirely and type "other" renders as "property".
/// Commercial: `"{Type} {for sale|to let}"`, with "other" rendering as
/// "Commercial property".
pub fn headline(category: Category, property_type: &str, original_bed: Option<i64>) -> String {
    let label = category.sale_or_let();
    let kind = property_type.to_lowercase();

    if category.is_residential() {
        if kind == "land" {
            return format!("{} {label}", title_case(property_type));
        }
        let bed_token = match original_bed {
            Some(n) if n > 0 => n.to_string(),
            _ => "Studio".to_string(),
        };
        if kind == "other" {
            format!("{bed_token} bedroom property {label}")
        } else {
            format!("{bed_token} bedroom {kind} {label}")
        }
    } else if kind == "other" {
        format!("Commercial property {label}")
    } else {
        format!("{} {label}", title_case(property_type))
    }
}

/// Synthesize the agent profile URL from the slugified branch name and id.
pub fn company_url(app_url: &str, branch_name: &str, branch_id: i64) -> String {
    format!(
        "{app_url}/agent/search/company/profile/{}-{branch_id}",
        slugify(branch_name)
    )
}

/// Synthesize the public listing URL from the category key and listing id.
pub fn listing_url(app_url: &str, category: Category, id: i64) -> String {
    format!("{app_url}/single-property/{}/{id}", category.key())
}

#[derive(Deserialize)]
struct GalleryBlob {
    #[serde(rename = "Gallery", default)]
    gallery: Vec<GalleryImage>,
}

#[derive(Deserialize)]
struct GalleryImage {
    #[serde(rename = "URL", default)]
    url: String,
}

/// Decode the embedded image-gallery blob into an ordered list of image
/// URLs. Malformed or absent blobs yield an empty list, never an error —
/// a broken gallery is data-quality noise, not a reason to drop the advert.
pub fn decode_gallery(blob: &str) -> Vec<String> {
    serde_json::from_str::<GalleryBlob>(blob)
        .map(|b| b.gallery.into_iter().map(|image| image.url).collect())
        .unwrap_or_default()
}

/// Transform one fetched row into an advert.
///
/// Returns `Ok(None)` for rows with a null price — they are excluded from
/// the feed and the ledger so the next run reconsiders them. A non-null
/// price that fails to parse is fatal ([`ExportError::Price`]): it means
/// the store itself is corrupt.
///
/// `display_city` is the postcode-resolved city (falling back to the row's
/// own); `images` is the decoded gallery.
pub fn to_advert(
    row: &ListingRow,
    category: Category,
    display_city: &str,
    images: Vec<String>,
    app_url: &str,
) -> Result<Option<Advert>, ExportError> {
    let Some(price_text) = row.price.as_deref() else {
        return Ok(None);
    };
    let price = Decimal::from_str(price_text.trim()).map_err(|_| ExportError::Price {
        id: row.id,
        value: price_text.to_string(),
    })?;

    let (beds, bathrooms) = normalized_rooms(category, row.bed, row.bathroom);
    let contact = row.contact_phone.clone().unwrap_or_default();

    Ok(Some(Advert {
        id: row.id,
        headline: headline(category, &row.property_type, row.bed),
        description: row.short_description.clone(),
        price,
        price_currency: "GBP".to_string(),
        company_url: company_url(app_url, &row.branch_name, row.branch_id),
        mobile: contact.clone(),
        phone: contact,
        url: listing_url(app_url, category, row.id),
        thumbnail: row.thumbnail.clone(),
        images: ImageUrls { image: images },
        main_category: category.key().to_string(),
        category_label: category.sale_or_let().to_string(),
        city: display_city.to_string(),
        postal_name: row.city.clone(),
        postcode: row.postcode.clone(),
        lat: row.lat,
        lng: row.lng,
        street_address: row.address_line1.clone(),
        beds,
        bathrooms,
    }))
}
