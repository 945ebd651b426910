//! Administration: store-wide introspection.

use crate::ServiceState;
use crate::account::AccountService;
use crate::error::AppError;
use crate::types::collections::{CARTS, CATEGORIES, PRODUCTS, USERS};
use crate::types::{StoreStats, User};

pub struct AdminService;

impl AdminService {
    /// Document counts per collection plus process uptime.
    pub async fn stats(state: &ServiceState) -> Result<StoreStats, AppError> {
        let store = state.store();
        Ok(StoreStats {
            backend: store.backend().to_string(),
            users: store.count(USERS).await?,
            categories: store.count(CATEGORIES).await?,
            products: store.count(PRODUCTS).await?,
            carts: store.count(CARTS).await?,
            uptime_seconds: state.uptime_secs(),
        })
    }

    pub async fn list_users(state: &ServiceState) -> Result<Vec<User>, AppError> {
        AccountService::list(state.store()).await
    }
}
