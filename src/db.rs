pub mod account_repo;
pub use account_repo::AccountRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod sequence_repo;
pub use sequence_repo::SequenceRepository;
pub mod attachment_repo;
pub use attachment_repo::AttachmentRepository;
pub mod quotation_repo;
pub use quotation_repo::QuotationRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod receipt_repo;
pub use receipt_repo::ReceiptRepository;
pub mod signature_template_repo;
pub use signature_template_repo::SignatureTemplateRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
