// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "docledger", description = "Orçamentos, faturas, pagamentos e recibos"),
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Account ---
        handlers::account::request_password_reset,
        handlers::account::verify_reset_token,
        handlers::account::reset_password,
        handlers::account::send_verification,
        handlers::account::verify_email,
        handlers::account::resend_verification,
        handlers::account::login_history,
        handlers::account::failed_logins,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,

        // --- Quotations ---
        handlers::quotations::create_quotation,
        handlers::quotations::list_quotations,
        handlers::quotations::get_quotation,
        handlers::quotations::update_quotation,
        handlers::quotations::delete_quotation,
        handlers::quotations::convert_to_invoice,
        handlers::quotations::add_signature,
        handlers::quotations::add_image,
        handlers::quotations::quotation_pdf,

        // --- Public ---
        handlers::public::get_public_quotation,
        handlers::public::approve_quotation,
        handlers::public::reject_quotation,

        // --- Invoices ---
        handlers::invoices::create_invoice,
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
        handlers::invoices::update_invoice_status,
        handlers::invoices::record_payment,
        handlers::invoices::add_signature,
        handlers::invoices::add_image,
        handlers::invoices::invoice_pdf,

        // --- Receipts ---
        handlers::receipts::list_receipts,
        handlers::receipts::get_receipt,
        handlers::receipts::list_by_invoice,
        handlers::receipts::add_signature,
        handlers::receipts::receipt_pdf,

        // --- Uploads ---
        handlers::uploads::upload_single,
        handlers::uploads::upload_multiple,
        handlers::uploads::delete_upload,

        // --- Signature templates ---
        handlers::signature_templates::list_templates,
        handlers::signature_templates::get_default_template,
        handlers::signature_templates::create_template,
        handlers::signature_templates::update_template,
        handlers::signature_templates::set_default_template,
        handlers::signature_templates::delete_template,

        // --- Admin ---
        handlers::admin::get_statistics,
        handlers::admin::list_users,
        handlers::admin::update_user_role,
    ),
    components(
        schemas(
            common::pagination::PaginationMeta,
            handlers::health::HealthStatus,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UpdateRolePayload,
            models::account::EmailPayload,
            models::account::ResetPasswordPayload,
            models::account::VerifyEmailPayload,
            models::account::ResetTokenOwner,
            models::account::LoginStatus,
            models::account::LoginHistoryEntry,

            // --- Customers / Products ---
            models::customer::Customer,
            models::customer::CustomerSummary,
            models::customer::CustomerDetail,
            models::customer::RecentQuotation,
            models::customer::RecentInvoice,
            models::customer::CreateCustomerPayload,
            models::customer::UpdateCustomerPayload,
            models::product::Product,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,

            // --- Documentos ---
            models::document::DocumentItem,
            models::document::DocumentImage,
            models::document::DocumentSignature,
            models::document::LineItemPayload,
            models::document::SignaturePayload,
            models::document::ImagePayload,

            models::quotation::QuotationStatus,
            models::quotation::ApprovalStatus,
            models::quotation::Quotation,
            models::quotation::InvoiceRef,
            models::quotation::QuotationDetail,
            models::quotation::CreateQuotationPayload,
            models::quotation::UpdateQuotationPayload,
            models::quotation::DecisionPayload,

            models::invoice::InvoiceStatus,
            models::invoice::Invoice,
            models::invoice::Payment,
            models::invoice::QuotationRef,
            models::invoice::InvoiceDetail,
            models::invoice::PaymentResult,
            models::invoice::CreateInvoicePayload,
            models::invoice::UpdateInvoicePayload,
            models::invoice::UpdateInvoiceStatusPayload,
            models::invoice::RecordPaymentPayload,

            models::receipt::Receipt,
            models::receipt::ReceiptView,
            models::receipt::ReceiptDetail,

            // --- Uploads / Templates ---
            models::upload::UploadedFile,
            handlers::uploads::SingleUploadForm,
            handlers::uploads::MultipleUploadForm,
            models::signature_template::SignatureTemplate,
            models::signature_template::CreateTemplatePayload,
            models::signature_template::UpdateTemplatePayload,

            // --- Admin ---
            models::dashboard::UserCounts,
            models::dashboard::DocumentCounts,
            models::dashboard::Receivables,
            models::dashboard::Statistics,
        )
    ),
    tags(
        (name = "Health", description = "Verificação do servidor"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Account", description = "Redefinição de senha, verificação de e-mail e histórico de login"),
        (name = "Customers", description = "Cadastro de Clientes"),
        (name = "Products", description = "Catálogo de Produtos e Serviços"),
        (name = "Quotations", description = "Orçamentos e conversão em fatura"),
        (name = "Public", description = "Aprovação do orçamento pelo cliente (sem login)"),
        (name = "Invoices", description = "Faturas e pagamentos"),
        (name = "Receipts", description = "Recibos emitidos a cada pagamento"),
        (name = "Uploads", description = "Imagens anexadas aos documentos"),
        (name = "Signature Templates", description = "Assinaturas salvas do usuário"),
        (name = "Admin", description = "Indicadores e gestão de usuários")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
