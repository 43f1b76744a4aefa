// src/services/dashboard_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        i18n::Msg,
        pagination::{Page, PageRequest},
    },
    db::{DashboardRepository, UserRepository},
    models::{
        auth::{User, UserRole},
        dashboard::{Statistics, UserCounts},
    },
};

const RECENT_USERS: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, user_repo, pool }
    }

    /// Painel do administrador: todas as contagens em paralelo.
    pub async fn statistics(&self) -> Result<Statistics, AppError> {
        let (total, admins, documents, receivables, recent_users) = tokio::try_join!(
            self.user_repo.count(),
            self.user_repo.count_admins(),
            self.repo.document_counts(),
            self.repo.receivables(),
            self.user_repo.recent(RECENT_USERS),
        )?;

        Ok(Statistics {
            users: UserCounts {
                total,
                admins,
                users: total - admins,
            },
            documents,
            receivables,
            recent_users,
        })
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<Page<User>, AppError> {
        let (items, total) = tokio::try_join!(self.user_repo.list(page), self.user_repo.count())?;
        Ok(Page::new(items, total, page))
    }

    pub async fn update_role(&self, actor: &User, id: Uuid, role: UserRole) -> Result<User, AppError> {
        let user = self
            .user_repo
            .update_role(&self.pool, id, role)
            .await?
            .ok_or(AppError::NotFound(Msg::UserNotFound))?;
        tracing::info!(actor = %actor.email, user = %user.email, role = ?role, "papel de usuário alterado");
        Ok(user)
    }
}
