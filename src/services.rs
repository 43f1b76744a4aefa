// src/services.rs

pub mod account_service;
pub mod auth;
pub mod customer_service;
pub mod dashboard_service;
pub mod document_service;
pub mod invoice_service;
pub mod notification_service;
pub mod notifier;
pub mod numbering_service;
pub mod pricing;
pub mod product_service;
pub mod quotation_service;
pub mod receipt_service;
pub mod side_effects;
pub mod signature_template_service;
pub mod upload_service;
