// src/services/signature_template_service.rs
//
// Assinaturas salvas por usuário. Cada usuário tem no máximo um template
// padrão; marcar um novo padrão desmarca os outros na mesma transação.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::Msg},
    db::SignatureTemplateRepository,
    models::signature_template::{CreateTemplatePayload, SignatureTemplate, UpdateTemplatePayload},
};

#[derive(Clone)]
pub struct SignatureTemplateService {
    repo: SignatureTemplateRepository,
    pool: PgPool,
}

impl SignatureTemplateService {
    pub fn new(repo: SignatureTemplateRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<SignatureTemplate>, AppError> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn default_for(&self, user_id: Uuid) -> Result<SignatureTemplate, AppError> {
        self.repo
            .find_default(user_id)
            .await?
            .ok_or(AppError::NotFound(Msg::TemplateNotFound))
    }

    pub async fn create(&self, user_id: Uuid, payload: &CreateTemplatePayload) -> Result<SignatureTemplate, AppError> {
        let mut tx = self.pool.begin().await?;
        if payload.is_default {
            self.repo.clear_default(&mut *tx, user_id, None).await?;
        }
        let template = self
            .repo
            .create(&mut *tx, user_id, payload.name.trim(), &payload.signature_data, payload.is_default)
            .await?;
        tx.commit().await?;
        Ok(template)
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: &UpdateTemplatePayload,
    ) -> Result<SignatureTemplate, AppError> {
        let mut tx = self.pool.begin().await?;
        if payload.is_default == Some(true) {
            self.repo.clear_default(&mut *tx, user_id, Some(id)).await?;
        }
        let template = self
            .repo
            .update(
                &mut *tx,
                id,
                user_id,
                payload.name.as_deref().map(str::trim),
                payload.signature_data.as_deref(),
                payload.is_default,
            )
            .await?
            .ok_or(AppError::NotFound(Msg::TemplateNotFound))?;
        tx.commit().await?;
        Ok(template)
    }

    pub async fn set_default(&self, id: Uuid, user_id: Uuid) -> Result<SignatureTemplate, AppError> {
        let payload = UpdateTemplatePayload {
            is_default: Some(true),
            ..Default::default()
        };
        self.update(id, user_id, &payload).await
    }

    // Templates de outro usuário contam como inexistentes
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        match self.repo.delete(&self.pool, id, user_id).await? {
            0 => Err(AppError::NotFound(Msg::TemplateNotFound)),
            _ => Ok(()),
        }
    }
}
