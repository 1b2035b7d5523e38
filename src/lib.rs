//! Storefront backend: public catalog, per-user carts, checkout with
//! stock accounting and a small admin surface, all over one JSON API.

pub mod api;
pub mod config;
pub mod entities;
pub mod errors;
pub mod middleware;
pub mod seed;
pub mod services;
