// src/models.rs

pub mod account;
pub mod auth;
pub mod customer;
pub mod dashboard;
pub mod document;
pub mod invoice;
pub mod product;
pub mod quotation;
pub mod receipt;
pub mod signature_template;
pub mod upload;
