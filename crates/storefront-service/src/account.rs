//! User accounts: registration and lookup.

use uuid::Uuid;

use crate::error::AppError;
use crate::store::DocumentStore;
use crate::types::collections::USERS;
use crate::types::{NewUser, User};

pub struct AccountService;

impl AccountService {
    /// Registers a user. Emails are stored lower-cased and must be unique.
    pub async fn register(store: &DocumentStore, req: NewUser) -> Result<User, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("name is required"));
        }

        let email = req.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::bad_request(format!(
                "invalid email address: '{}'",
                req.email.trim()
            )));
        }

        let existing: Vec<User> = store.find_by(USERS, "email", &email).await?;
        if !existing.is_empty() {
            return Err(AppError::conflict(format!(
                "email '{email}' is already registered"
            )));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            email,
        };
        store.insert(USERS, &user).await.map_err(|e| {
            e.on_conflict(|| format!("email '{}' is already registered", user.email))
        })?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn get(store: &DocumentStore, id: &str) -> Result<User, AppError> {
        store
            .get(USERS, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user '{id}' not found")))
    }

    pub async fn list(store: &DocumentStore) -> Result<Vec<User>, AppError> {
        store.list(USERS).await
    }
}

/// Shallow shape check: `local@domain.tld`, no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
