// src/middleware.rs

pub mod auth;
pub mod client;
pub mod i18n;
