// src/services/product_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        i18n::Msg,
        pagination::{Page, PageRequest},
    },
    db::ProductRepository,
    models::product::{CreateProductPayload, Product, UpdateProductPayload},
};

#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
    pool: PgPool,
}

impl ProductService {
    pub fn new(repo: ProductRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        active_only: bool,
        page: PageRequest,
    ) -> Result<Page<Product>, AppError> {
        let (items, total) = tokio::try_join!(
            self.repo.list(search, active_only, page),
            self.repo.count(search, active_only)
        )?;
        Ok(Page::new(items, total, page))
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Msg::ProductNotFound))
    }

    pub async fn create(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        self.repo.create(&self.pool, payload).await
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Product, AppError> {
        self.repo
            .update(&self.pool, id, payload)
            .await?
            .ok_or(AppError::NotFound(Msg::ProductNotFound))
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<(), AppError> {
        match self.repo.deactivate(&self.pool, id).await? {
            0 => Err(AppError::NotFound(Msg::ProductNotFound)),
            _ => {
                tracing::info!(product_id = %id, "produto desativado");
                Ok(())
            }
        }
    }
}
