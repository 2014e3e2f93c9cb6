//! The closed set of listing categories driving table, filename, and
//! business-rule selection.
//!
//! Each category maps 1:1 to a source table and a destination feed file.
//! The set is fixed at compile time — there is no runtime registration.

use std::fmt;

/// A listing category.
///
/// Determines which store table is queried, which feed file receives the
/// output, and which transformation rules (bedroom handling, headline shape)
/// apply to rows fetched from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    ResidentialForSale,
    ResidentialToRent,
    CommercialForSale,
    CommercialToRent,
}

impl Category {
    /// All categories in driver iteration order. The export pipeline runs
    /// them strictly sequentially in this order.
    pub const ALL: [Category; 4] = [
        Category::ResidentialForSale,
        Category::ResidentialToRent,
        Category::CommercialForSale,
        Category::CommercialToRent,
    ];

    /// The hyphenated category key used in listing URLs and log headers.
    pub fn key(self) -> &'static str {
        match self {
            Category::ResidentialForSale => "residential-for-sale",
            Category::ResidentialToRent => "residential-to-rent",
            Category::CommercialForSale => "commercial-for-sale",
            Category::CommercialToRent => "commercial-to-rent",
        }
    }

    /// The store table holding this category's listings.
    pub fn table(self) -> &'static str {
        match self {
            Category::ResidentialForSale => "residential_for_sales",
            Category::ResidentialToRent => "residential_to_rents",
            Category::CommercialForSale => "commercial_for_sales",
            Category::CommercialToRent => "commercial_to_rents",
        }
    }

    /// The feed file this category's adverts are appended to.
    pub fn feed_file(self) -> &'static str {
        match self {
            Category::ResidentialForSale => "feed1.xml",
            Category::ResidentialToRent => "feed2.xml",
            Category::CommercialForSale => "feed3.xml",
            Category::CommercialToRent => "feed4.xml",
        }
    }

    /// Reverse of [`feed_file`](Self::feed_file), used by the link validator
    /// to label log sections for files found in the feeds directory.
    pub fn from_feed_file(name: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.feed_file() == name)
    }

    /// Display label derived from the key's tail: `to-rent` categories
    /// render as "to let", everything else as "for sale".
    pub fn sale_or_let(self) -> &'static str {
        let tail = match self.key().split_once('-') {
            Some((_, rest)) => rest.replace('-', " "),
            None => String::new(),
        };
        if tail == "to rent" {
            "to let"
        } else {
            "for sale"
        }
    }

    pub fn is_residential(self) -> bool {
        matches!(
            self,
            Category::ResidentialForSale | Category::ResidentialToRent
        )
    }

    pub fn is_commercial(self) -> bool {
        !self.is_residential()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
