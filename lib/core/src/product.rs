use crate::vector::Vector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Price at or below which a product earns the `budget` badge (minor units)
pub const BUDGET_BADGE_MAX_CENTS: u64 = 2000;

/// Rating at or above which a product earns the `top_rated` badge
pub const TOP_RATED_MIN: f32 = 4.5;

/// Opaque product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Uuid> for ProductId {
    fn from(u: Uuid) -> Self {
        Self(u.to_string())
    }
}

/// A catalog product. Owned by the storage engine and read-only to search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(default = "ProductId::random")]
    pub id: ProductId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Vec<String>,
    #[serde(default)]
    pub material: Vec<String>,
    #[serde(default)]
    pub size: Vec<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Price in minor currency units (cents)
    #[serde(default)]
    pub price_cents: Option<u64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_embedding: Option<Vector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_embedding: Option<Vector>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_in_stock() -> bool {
    true
}

/// Presentation flags derived from commercial fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    InStock,
    TopRated,
    Budget,
}

impl Product {
    /// Create an empty in-stock product with a random id
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::random(),
            title: Some(title.into()),
            brand: None,
            category: Vec::new(),
            description: None,
            color: Vec::new(),
            material: Vec::new(),
            size: Vec::new(),
            gender: None,
            attributes: serde_json::Map::new(),
            price_cents: None,
            currency: default_currency(),
            in_stock: true,
            rating: None,
            image_url: None,
            url: None,
            text_embedding: None,
            image_embedding: None,
            keywords: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<ProductId>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    #[must_use]
    pub fn with_price_cents(mut self, price: u64) -> Self {
        self.price_cents = Some(price);
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    pub fn with_category<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_color<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.color = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_material<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.material = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_size<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.size = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = tags.into_iter().map(|t| t.into().to_lowercase()).collect();
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn with_in_stock(mut self, in_stock: bool) -> Self {
        self.in_stock = in_stock;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_text_embedding(mut self, embedding: Vector) -> Self {
        self.text_embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn with_image_embedding(mut self, embedding: Vector) -> Self {
        self.image_embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    /// Whether any material tag equals one of `wanted` (case-insensitive)
    pub fn has_material(&self, wanted: &[&str]) -> bool {
        self.material
            .iter()
            .any(|m| wanted.iter().any(|w| m.eq_ignore_ascii_case(w)))
    }

    /// Boolean attribute lookup; anything but a JSON `true` is false
    pub fn attribute_is_true(&self, key: &str) -> bool {
        matches!(self.attributes.get(key), Some(serde_json::Value::Bool(true)))
    }

    /// Text the catalog embeds for this product
    pub fn embedding_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.title.as_deref());
        parts.extend(self.brand.as_deref());
        parts.extend(self.category.iter().map(String::as_str));
        parts.extend(self.description.as_deref());
        parts.extend(self.color.iter().map(String::as_str));
        parts.extend(self.material.iter().map(String::as_str));
        parts.extend(self.keywords.iter().map(String::as_str));
        parts.join(" ")
    }

    pub fn badges(&self) -> Vec<Badge> {
        let mut badges = Vec::new();
        if self.in_stock {
            badges.push(Badge::InStock);
        }
        if self.rating.unwrap_or(0.0) >= TOP_RATED_MIN {
            badges.push(Badge::TopRated);
        }
        if self.price_cents.unwrap_or(0) <= BUDGET_BADGE_MAX_CENTS {
            badges.push(Badge::Budget);
        }
        badges
    }
}

/// Case-insensitive intersection test between two tag sets
pub fn tags_intersect<A, B>(left: &[A], right: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    left.iter()
        .any(|l| right.iter().any(|r| l.as_ref().eq_ignore_ascii_case(r.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_applies_defaults() {
        let product: Product = serde_json::from_value(json!({
            "id": "sku-1",
            "title": "Trail Runner",
            "price_cents": 8999
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "sku-1");
        assert_eq!(product.currency, "USD");
        assert!(product.in_stock);
        assert!(product.text_embedding.is_none());
        assert!(product.keywords.is_empty());
    }

    #[test]
    fn test_badges() {
        let cheap = Product::new("socks").with_price_cents(1500).with_rating(4.8);
        assert_eq!(cheap.badges(), vec![Badge::InStock, Badge::TopRated, Badge::Budget]);

        let pricey = Product::new("boots")
            .with_price_cents(25000)
            .with_rating(4.0)
            .with_in_stock(false);
        assert!(pricey.badges().is_empty());
    }

    #[test]
    fn test_tags_intersect_ignores_case() {
        assert!(tags_intersect(&["Mesh", "rubber"], &["mesh"]));
        assert!(!tags_intersect(&["leather"], &["nylon", "mesh"]));
        assert!(!tags_intersect::<&str, &str>(&[], &["mesh"]));
    }

    #[test]
    fn test_attribute_is_true_requires_json_bool() {
        let p = Product::new("jacket")
            .with_attribute("waterproof", json!(true))
            .with_attribute("windproof", json!("true"));
        assert!(p.attribute_is_true("waterproof"));
        assert!(!p.attribute_is_true("windproof"));
        assert!(!p.attribute_is_true("missing"));
    }

    #[test]
    fn test_keywords_lowercased() {
        let p = Product::new("x").with_keywords(["Running", "TRAIL"]);
        assert_eq!(p.keywords, vec!["running", "trail"]);
    }
}
