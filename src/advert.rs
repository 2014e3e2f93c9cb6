//! The advertisement record and its XML wire shape.
//!
//! One [`Advert`] is serialized per exported listing as an indented `<ad>`
//! fragment. Feed files are a concatenation of such fragments without an
//! enclosing root element — downstream finishing wraps them before
//! syndication, and [`parse_fragments`] wraps them in a synthetic root when
//! the link validator re-reads a file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered list of image URLs, serialized as `<ad__all_imageurls><image>…`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageUrls {
    #[serde(rename = "image", default)]
    pub image: Vec<String>,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// A single advertisement as it appears in a feed document.
///
/// Field order is the wire order. Bedroom and bathroom counts are omitted
/// from the output when zero, so commercial adverts carry neither element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ad", default)]
pub struct Advert {
    #[serde(rename = "ad__number_reference_id")]
    pub id: i64,
    #[serde(rename = "ad__headline")]
    pub headline: String,
    #[serde(rename = "ad__description")]
    pub description: String,
    /// Exact decimal price — parsed from the stored text representation so
    /// currency figures never pass through binary floating point.
    #[serde(rename = "ad__price")]
    pub price: Decimal,
    #[serde(rename = "ad__price_currency")]
    pub price_currency: String,
    #[serde(rename = "advertiser__company_homepage_url")]
    pub company_url: String,
    #[serde(rename = "advertiser__mobile")]
    pub mobile: String,
    #[serde(rename = "advertiser__phone")]
    pub phone: String,
    #[serde(rename = "ad__url")]
    pub url: String,
    #[serde(rename = "ad__imageurl")]
    pub thumbnail: String,
    #[serde(rename = "ad__all_imageurls")]
    pub images: ImageUrls,
    #[serde(rename = "maincategory_original")]
    pub main_category: String,
    #[serde(rename = "category_original")]
    pub category_label: String,
    #[serde(rename = "location__municipality_city")]
    pub city: String,
    #[serde(rename = "location__postal_name")]
    pub postal_name: String,
    #[serde(rename = "location__zip_postal_code")]
    pub postcode: String,
    #[serde(rename = "location__latitude")]
    pub lat: f64,
    #[serde(rename = "location__longitude")]
    pub lng: f64,
    #[serde(rename = "location__streetaddress")]
    pub street_address: String,
    #[serde(rename = "real_estate__beds", skip_serializing_if = "is_zero")]
    pub beds: i64,
    #[serde(
        rename = "real_estate__number_of_bathrooms",
        skip_serializing_if = "is_zero"
    )]
    pub bathrooms: i64,
}

/// Serialize one advert as an indented `<ad>` fragment.
pub fn to_fragment(advert: &Advert) -> Result<String, quick_xml::SeError> {
    let mut out = String::new();
    let mut ser = quick_xml::se::Serializer::new(&mut out);
    ser.indent(' ', 4);
    advert.serialize(ser)?;
    Ok(out)
}

/// Parse a feed file's fragment concatenation back into adverts.
///
/// Feed files carry no root element (see module docs), so the content is
/// wrapped in a synthetic root before deserializing. An empty file yields
/// an empty list.
pub fn parse_fragments(content: &str) -> Result<Vec<Advert>, quick_xml::DeError> {
    #[derive(Deserialize)]
    struct FeedDocument {
        #[serde(rename = "ad", default)]
        ads: Vec<Advert>,
    }

    let wrapped = format!("<feed>{content}</feed>");
    let document: FeedDocument = quick_xml::de::from_str(&wrapped)?;
    Ok(document.ads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn sample_advert() -> Advert {
        Advert {
            id: 42,
            headline: "2 bedroom flat for sale".to_string(),
            description: "Bright corner flat".to_string(),
            price: Decimal::from_str("250000.00").unwrap(),
            price_currency: "GBP".to_string(),
            company_url: "https://example.com/agent/search/company/profile/acme-homes-7".to_string(),
            mobile: "07700 900000".to_string(),
            phone: "07700 900000".to_string(),
            url: "https://example.com/single-property/residential-for-sale/42".to_string(),
            thumbnail: "https://img.example.com/42/thumb.jpg".to_string(),
            images: ImageUrls {
                image: vec![
                    "https://img.example.com/42/1.jpg".to_string(),
                    "https://img.example.com/42/2.jpg".to_string(),
                ],
            },
            main_category: "residential-for-sale".to_string(),
            category_label: "for sale".to_string(),
            city: "Springfield".to_string(),
            postal_name: "Anytown".to_string(),
            postcode: "AB1 2CD".to_string(),
            lat: 51.5,
            lng: -0.12,
            street_address: "1 High Street".to_string(),
            beds: 2,
            bathrooms: 1,
        }
    }

    #[test]
    fn test_fragment_round_trip() {
        let advert = sample_advert();
        let fragment = to_fragment(&advert).unwrap();
        let parsed = parse_fragments(&fragment).unwrap();
        assert_eq!(parsed, vec![advert]);
    }

    #[test]
    fn test_fragment_preserves_price_scale() {
        let fragment = to_fragment(&sample_advert()).unwrap();
        assert!(fragment.contains("<ad__price>250000.00</ad__price>"));
    }

    #[test]
    fn test_zero_rooms_are_omitted() {
        let mut advert = sample_advert();
        advert.beds = 0;
        advert.bathrooms = 0;
        let fragment = to_fragment(&advert).unwrap();
        assert!(!fragment.contains("real_estate__beds"));
        assert!(!fragment.contains("real_estate__number_of_bathrooms"));
    }

    #[test]
    fn test_image_list_order_is_preserved() {
        let fragment = to_fragment(&sample_advert()).unwrap();
        let first = fragment.find("1.jpg").unwrap();
        let second = fragment.find("2.jpg").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_parse_concatenated_fragments() {
        let mut a = sample_advert();
        let mut b = sample_advert();
        a.id = 1;
        b.id = 2;
        let content = format!("{}\n{}\n", to_fragment(&a).unwrap(), to_fragment(&b).unwrap());
        let parsed = parse_fragments(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, 1);
        assert_eq!(parsed[1].id, 2);
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse_fragments("").unwrap().is_empty());
    }
}
