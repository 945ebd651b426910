//! HTTP route handlers, one router per mounted resource.

pub mod admin;
pub mod cart;
pub mod category;
pub mod fallback;
pub mod product;
pub mod user;
