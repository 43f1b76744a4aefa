// src/handlers.rs

pub mod account;
pub mod admin;
pub mod auth;
pub mod customers;
pub mod health;
pub mod invoices;
pub mod products;
pub mod public;
pub mod quotations;
pub mod receipts;
pub mod signature_templates;
pub mod uploads;
