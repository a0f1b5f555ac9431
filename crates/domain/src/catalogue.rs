//! Product catalogue types and the built-in seed catalogue.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Fixed catalogue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Necklaces,
    Rings,
    Earrings,
    Bracelets,
    #[serde(rename = "Bridal Sets")]
    BridalSets,
    #[serde(rename = "Gold Coins")]
    GoldCoins,
    Ornaments,
}

impl Category {
    /// Display name used by the storefront.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Necklaces => "Necklaces",
            Category::Rings => "Rings",
            Category::Earrings => "Earrings",
            Category::Bracelets => "Bracelets",
            Category::BridalSets => "Bridal Sets",
            Category::GoldCoins => "Gold Coins",
            Category::Ornaments => "Ornaments",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hallmark and provenance details shown on the product page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductSpecifications {
    pub purity: String,
    pub weight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stones: Option<String>,
    pub collection: String,
}

/// A purchasable catalogue entry.
///
/// `stock` is signed because the unchecked stock policy lets concurrent
/// checkouts drive it below zero; the conditional policy never commits a
/// negative value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Money>,
    pub category: Category,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub is_new: bool,
    pub stock: i64,
    #[serde(default)]
    pub specifications: ProductSpecifications,
}

impl Product {
    /// Creates a product with the required fields; the rest are empty.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        category: Category,
        stock: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            discounted_price: None,
            category,
            image: String::new(),
            gallery: Vec::new(),
            is_new: false,
            stock,
            specifications: ProductSpecifications::default(),
        }
    }

    /// Returns true if at least one unit can be allocated.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// The catalogue loaded into an empty store on first start.
pub fn seed_catalogue() -> Vec<Product> {
    vec![
        Product {
            id: ProductId::new("p1"),
            name: "The Royal Kundan Choker".to_string(),
            description: "A masterpiece featuring hand-carved emeralds and polki diamonds set in 22kt BIS hallmarked gold.".to_string(),
            price: Money::from_rupees(450_000),
            discounted_price: None,
            category: Category::Necklaces,
            image: "https://images.unsplash.com/photo-1599643478518-17488fbbcd75".to_string(),
            gallery: vec![
                "https://images.unsplash.com/photo-1515562141207-7a18b5ce7142".to_string(),
                "https://images.unsplash.com/photo-1601121141461-9d6647bca1ed".to_string(),
            ],
            is_new: true,
            stock: 5,
            specifications: ProductSpecifications {
                purity: "22 KT Gold".to_string(),
                weight: "85.2 g".to_string(),
                dimensions: None,
                stones: Some("Polki Diamonds, Zambian Emeralds".to_string()),
                collection: "Rivaah Bridal".to_string(),
            },
        },
        Product {
            id: ProductId::new("p2"),
            name: "Solitaire Diamond Band".to_string(),
            description: "A GIA certified 1-carat brilliant cut diamond solitaire set in 950 Platinum.".to_string(),
            price: Money::from_rupees(285_000),
            discounted_price: None,
            category: Category::Rings,
            image: "https://images.unsplash.com/photo-1605100804763-247f67b3557e".to_string(),
            gallery: vec![
                "https://images.unsplash.com/photo-1603561591411-071c4f723932".to_string(),
            ],
            is_new: false,
            stock: 12,
            specifications: ProductSpecifications {
                purity: "950 Platinum".to_string(),
                weight: "4.5 g".to_string(),
                dimensions: None,
                stones: Some("VVS1 Diamond (1.0 ct)".to_string()),
                collection: "Modern Love".to_string(),
            },
        },
        Product {
            id: ProductId::new("p3"),
            name: "Heritage Ruby Jhumkas".to_string(),
            description: "Exquisite bell earrings featuring pigeon-blood rubies and freshwater pearls.".to_string(),
            price: Money::from_rupees(125_000),
            discounted_price: None,
            category: Category::Earrings,
            image: "https://images.unsplash.com/photo-1630019852942-f89202989a51".to_string(),
            gallery: vec![
                "https://images.unsplash.com/photo-1635767798638-3e25273a8236".to_string(),
            ],
            is_new: false,
            stock: 2,
            specifications: ProductSpecifications {
                purity: "22 KT Gold".to_string(),
                weight: "24.1 g".to_string(),
                dimensions: None,
                stones: Some("Burmese Rubies, Pearls".to_string()),
                collection: "Virasat".to_string(),
            },
        },
        Product {
            id: ProductId::new("p4"),
            name: "Ethereal Crystal Ganesha".to_string(),
            description: "A divine home ornament crafted from pure lead-free crystal with 24kt gold gilded detailing.".to_string(),
            price: Money::from_rupees(18_500),
            discounted_price: None,
            category: Category::Ornaments,
            image: "https://images.unsplash.com/photo-1567593322472-49262512458a".to_string(),
            gallery: vec![
                "https://images.unsplash.com/photo-1544947950-fa07a98d237f".to_string(),
            ],
            is_new: true,
            stock: 0,
            specifications: ProductSpecifications {
                purity: "24 KT Gold Gilded".to_string(),
                weight: "1.2 kg".to_string(),
                dimensions: None,
                stones: Some("Crystal".to_string()),
                collection: "Divine Grace".to_string(),
            },
        },
    ]
}
