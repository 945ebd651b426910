//! Catalog: categories and the products filed under them.

use uuid::Uuid;

use crate::error::AppError;
use crate::store::DocumentStore;
use crate::types::collections::{CATEGORIES, PRODUCTS};
use crate::types::{Category, NewCategory, NewProduct, Product, ProductFilter};

pub struct CatalogService;

impl CatalogService {
    pub async fn list_categories(store: &DocumentStore) -> Result<Vec<Category>, AppError> {
        store.list(CATEGORIES).await
    }

    /// Creates a category. Names are unique.
    pub async fn create_category(
        store: &DocumentStore,
        req: NewCategory,
    ) -> Result<Category, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("category name is required"));
        }

        let existing: Vec<Category> = store.find_by(CATEGORIES, "name", name).await?;
        if !existing.is_empty() {
            return Err(AppError::conflict(format!(
                "category '{name}' already exists"
            )));
        }

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            description: non_blank(req.description),
        };
        store.insert(CATEGORIES, &category).await.map_err(|e| {
            e.on_conflict(|| format!("category '{}' already exists", category.name))
        })?;
        tracing::info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn get_category(store: &DocumentStore, id: &str) -> Result<Category, AppError> {
        store
            .get(CATEGORIES, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("category '{id}' not found")))
    }

    pub async fn delete_category(store: &DocumentStore, id: &str) -> Result<(), AppError> {
        if store.delete(CATEGORIES, id).await? {
            tracing::info!(category_id = %id, "category deleted");
            Ok(())
        } else {
            Err(AppError::not_found(format!("category '{id}' not found")))
        }
    }

    pub async fn list_products(
        store: &DocumentStore,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, AppError> {
        match filter.category.as_deref() {
            Some(category) => store.find_by(PRODUCTS, "category", category).await,
            None => store.list(PRODUCTS).await,
        }
    }

    /// Creates a product. A referenced category must exist.
    pub async fn create_product(
        store: &DocumentStore,
        req: NewProduct,
    ) -> Result<Product, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("product name is required"));
        }
        if !req.price.is_finite() || req.price < 0.0 {
            return Err(AppError::bad_request(
                "price must be a non-negative number",
            ));
        }

        let category = non_blank(req.category);
        if let Some(id) = category.as_deref() {
            Self::get_category(store, id).await?;
        }

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            price: req.price,
            category,
            description: non_blank(req.description),
        };
        store.insert(PRODUCTS, &product).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn get_product(store: &DocumentStore, id: &str) -> Result<Product, AppError> {
        store
            .get(PRODUCTS, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("product '{id}' not found")))
    }

    pub async fn delete_product(store: &DocumentStore, id: &str) -> Result<(), AppError> {
        if store.delete(PRODUCTS, id).await? {
            tracing::info!(product_id = %id, "product deleted");
            Ok(())
        } else {
            Err(AppError::not_found(format!("product '{id}' not found")))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
