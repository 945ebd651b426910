//! Per-user carts.
//!
//! A cart is one document keyed by the user id. Missing carts read as empty.
//! Item changes are single atomic store updates, so concurrent requests for
//! the same cart never overwrite each other.

use crate::catalog::CatalogService;
use crate::error::AppError;
use crate::store::{ArrayField, DocumentStore};
use crate::types::collections::CARTS;
use crate::types::{AddCartItem, Cart};

/// Cart line items, keyed by product id.
const CART_ITEMS: ArrayField<'static> = ArrayField {
    array: "items",
    key: "product_id",
    counter: "quantity",
};

pub struct CartService;

impl CartService {
    pub async fn get(store: &DocumentStore, user_id: &str) -> Result<Cart, AppError> {
        Ok(store
            .get(CARTS, user_id)
            .await?
            .unwrap_or_else(|| Cart::empty(user_id)))
    }

    /// Adds a product to the cart, accumulating quantity for products
    /// already present.
    pub async fn add_item(
        store: &DocumentStore,
        user_id: &str,
        req: AddCartItem,
    ) -> Result<Cart, AppError> {
        if req.quantity == 0 {
            return Err(AppError::bad_request("quantity must be at least 1"));
        }
        CatalogService::get_product(store, &req.product_id).await?;

        store
            .increment_element(CARTS, user_id, &CART_ITEMS, &req.product_id, req.quantity)
            .await
    }

    pub async fn remove_item(
        store: &DocumentStore,
        user_id: &str,
        product_id: &str,
    ) -> Result<Cart, AppError> {
        store
            .pull_element(CARTS, user_id, &CART_ITEMS, product_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("product '{product_id}' is not in the cart")))
    }

    pub async fn clear(store: &DocumentStore, user_id: &str) -> Result<(), AppError> {
        store.delete(CARTS, user_id).await?;
        Ok(())
    }
}
