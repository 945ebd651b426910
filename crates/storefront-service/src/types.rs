//! Documents and request payloads shared by the service layer and transports.
//!
//! No HTTP dependencies. Stored documents use `_id` as their primary key.

use serde::{Deserialize, Serialize};

/// Collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CATEGORIES: &str = "categories";
    pub const PRODUCTS: &str = "products";
    pub const CARTS: &str = "carts";

    /// `(collection, field)` pairs whose values must be unique.
    pub const UNIQUE_FIELDS: &[(&str, &str)] = &[(USERS, "email"), (CATEGORIES, "name")];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Id of the owning category, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Query filter for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
}

/// A user's cart. Keyed by the owning user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "_id")]
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItem {
    pub product_id: String,
    pub quantity: u32,
}

/// Document counts reported by the admin stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub backend: String,
    pub users: u64,
    pub categories: u64,
    pub products: u64,
    pub carts: u64,
    pub uptime_seconds: u64,
}
