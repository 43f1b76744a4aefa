// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::auth::User;

// 1. Usuários por papel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub total: i64,
    pub admins: i64,
    pub users: i64,
}

// 2. Documentos por status (cards do topo)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCounts {
    pub quotations: i64,
    pub pending_quotations: i64,
    pub converted_quotations: i64,
    pub invoices: i64,
    pub unpaid_invoices: i64,
    pub partial_invoices: i64,
    pub paid_invoices: i64,
    pub receipts: i64,
    pub customers: i64,
    pub active_products: i64,
}

// 3. Valores em aberto / recebidos
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Receivables {
    #[schema(value_type = String)]
    pub outstanding: Decimal,
    #[schema(value_type = String)]
    pub collected: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub users: UserCounts,
    pub documents: DocumentCounts,
    pub receivables: Receivables,
    pub recent_users: Vec<User>,
}
