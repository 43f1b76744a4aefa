// src/services/customer_service.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        i18n::Msg,
        pagination::{Page, PageRequest},
    },
    db::CustomerRepository,
    models::{
        customer::{CreateCustomerPayload, Customer, CustomerDetail, CustomerSummary, UpdateCustomerPayload},
        document::CustomerSnapshot,
    },
};

const RECENT_DOCUMENTS: i64 = 5;

/// Campos de cliente enviados junto com um orçamento/fatura.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotFields<'a> {
    pub name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub email: Option<&'a str>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn snapshot_of(customer: &Customer) -> CustomerSnapshot {
    CustomerSnapshot {
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        address: customer.address.clone(),
        email: customer.email.clone(),
    }
}

/// Sobrepõe os campos enviados à base. Campo em branco não apaga o da base.
/// O nome é obrigatório no resultado.
pub fn overlay_snapshot(base: CustomerSnapshot, fields: SnapshotFields<'_>) -> Result<CustomerSnapshot, AppError> {
    let snapshot = CustomerSnapshot {
        name: non_blank(fields.name).unwrap_or_else(|| base.name.trim().to_string()),
        phone: non_blank(fields.phone).or(base.phone),
        address: non_blank(fields.address).or(base.address),
        email: non_blank(fields.email).or(base.email),
    };
    if snapshot.name.is_empty() {
        return Err(AppError::BadRequest(Msg::CustomerNameRequired));
    }
    Ok(snapshot)
}

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    pool: PgPool,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<CustomerSummary>, AppError> {
        let (items, total) = tokio::try_join!(self.repo.list(search, page), self.repo.count(search))?;
        Ok(Page::new(items, total, page))
    }

    pub async fn find(&self, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Msg::CustomerNotFound))
    }

    pub async fn get(&self, id: Uuid) -> Result<CustomerDetail, AppError> {
        let customer = self.find(id).await?;
        let (recent_quotations, recent_invoices) = tokio::try_join!(
            self.repo.recent_quotations(id, RECENT_DOCUMENTS),
            self.repo.recent_invoices(id, RECENT_DOCUMENTS)
        )?;
        Ok(CustomerDetail {
            customer,
            recent_quotations,
            recent_invoices,
        })
    }

    pub async fn create(&self, payload: &CreateCustomerPayload) -> Result<Customer, AppError> {
        if payload.name.trim().is_empty() {
            return Err(AppError::BadRequest(Msg::CustomerNameRequired));
        }
        self.repo.create(&self.pool, payload).await
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateCustomerPayload) -> Result<Customer, AppError> {
        if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::BadRequest(Msg::CustomerNameRequired));
        }
        self.repo
            .update(&self.pool, id, payload)
            .await?
            .ok_or(AppError::NotFound(Msg::CustomerNotFound))
    }

    /// Documentos emitidos mantêm o snapshot; só perdem a referência.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete(&self.pool, id).await? {
            0 => Err(AppError::NotFound(Msg::CustomerNotFound)),
            _ => Ok(()),
        }
    }

    /// Monta o snapshot do documento: parte do cadastro do cliente (se
    /// `customer_id` veio) ou de `fallback`, e aplica os campos enviados.
    /// Na edição, `executor` é a transação que já segura o documento.
    pub async fn resolve_snapshot<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
        fallback: CustomerSnapshot,
        fields: SnapshotFields<'_>,
    ) -> Result<CustomerSnapshot, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let base = match customer_id {
            Some(id) => {
                let customer = self
                    .repo
                    .find_by_id(executor, id)
                    .await?
                    .ok_or(AppError::NotFound(Msg::CustomerNotFound))?;
                snapshot_of(&customer)
            }
            None => fallback,
        };
        overlay_snapshot(base, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CustomerSnapshot {
        CustomerSnapshot {
            name: "ACME".into(),
            phone: Some("021234567".into()),
            address: Some("Bangkok".into()),
            email: Some("acme@example.com".into()),
        }
    }

    #[test]
    fn payload_fields_override_the_record() {
        let fields = SnapshotFields {
            name: Some("ACME Thailand"),
            email: Some("billing@acme.co.th"),
            ..Default::default()
        };
        let snapshot = overlay_snapshot(base(), fields).unwrap();
        assert_eq!(snapshot.name, "ACME Thailand");
        assert_eq!(snapshot.email.as_deref(), Some("billing@acme.co.th"));
        assert_eq!(snapshot.phone.as_deref(), Some("021234567"));
    }

    #[test]
    fn blank_fields_keep_the_record_values() {
        let fields = SnapshotFields {
            name: Some("   "),
            phone: Some(""),
            ..Default::default()
        };
        let snapshot = overlay_snapshot(base(), fields).unwrap();
        assert_eq!(snapshot, base());
    }

    #[test]
    fn name_is_required_after_merge() {
        let err = overlay_snapshot(CustomerSnapshot::default(), SnapshotFields::default()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(Msg::CustomerNameRequired)));
    }

    #[test]
    fn walk_in_customer_only_needs_a_name() {
        let fields = SnapshotFields {
            name: Some(" Somchai "),
            ..Default::default()
        };
        let snapshot = overlay_snapshot(CustomerSnapshot::default(), fields).unwrap();
        assert_eq!(snapshot.name, "Somchai");
        assert!(snapshot.email.is_none());
    }
}
