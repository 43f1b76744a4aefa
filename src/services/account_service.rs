// src/services/account_service.rs
//
// Redefinição de senha, verificação de e-mail e histórico de login.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{auth::hash_password, notification_service::NotificationService};
use crate::{
    common::{
        error::AppError,
        i18n::Msg,
        pagination::{Page, PageRequest},
    },
    db::{account_repo::NewLogin, AccountRepository, UserRepository},
    middleware::client::ClientInfo,
    models::{
        account::{LoginHistoryEntry, LoginStatus, ResetPasswordPayload, ResetTokenOwner},
        auth::User,
    },
};

pub const RESET_TOKEN_TTL_HOURS: i64 = 1;
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
pub const RECENT_FAILED_LOGINS: i64 = 10;

/// Token opaco de 64 caracteres hexadecimais.
pub fn new_account_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub fn reset_link(public_base_url: &str, token: &str) -> String {
    format!("{}/reset-password/{}", public_base_url.trim_end_matches('/'), token)
}

pub fn verification_link(public_base_url: &str, token: &str) -> String {
    format!("{}/verify-email/{}", public_base_url.trim_end_matches('/'), token)
}

/// Por que um token de redefinição não pode mais ser usado.
/// A expiração é conferida antes do uso.
pub fn reset_token_problem(
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<Msg> {
    if now > expires_at {
        Some(Msg::TokenExpired)
    } else if used_at.is_some() {
        Some(Msg::TokenAlreadyUsed)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub browser: &'static str,
    pub os: &'static str,
    pub device: &'static str,
}

/// Classificação grosseira do User-Agent. A ordem importa: o UA do Edge
/// também diz "Chrome", o do Chrome diz "Safari", o do Android diz "Linux".
pub fn parse_user_agent(user_agent: &str) -> DeviceInfo {
    let has = |needle: &str| user_agent.contains(needle);

    let browser = if has("Edg") {
        "Edge"
    } else if has("Chrome") || has("CriOS") {
        "Chrome"
    } else if has("Firefox") || has("FxiOS") {
        "Firefox"
    } else if has("Safari") {
        "Safari"
    } else {
        "Unknown"
    };

    let os = if has("Windows") {
        "Windows"
    } else if has("iPhone") || has("iPad") || has("iPod") {
        "iOS"
    } else if has("Android") {
        "Android"
    } else if has("Mac") {
        "macOS"
    } else if has("Linux") {
        "Linux"
    } else {
        "Unknown"
    };

    let device = if has("iPad") || has("Tablet") {
        "Tablet"
    } else if has("Mobile") {
        "Mobile"
    } else {
        "Desktop"
    };

    DeviceInfo { browser, os, device }
}

#[derive(Clone)]
pub struct AccountService {
    account_repo: AccountRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    public_base_url: String,
    pool: PgPool,
}

impl AccountService {
    pub fn new(
        account_repo: AccountRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
        public_base_url: String,
        pool: PgPool,
    ) -> Self {
        Self {
            account_repo,
            user_repo,
            notifications,
            public_base_url,
            pool,
        }
    }

    // =========================================================================
    //  REDEFINIÇÃO DE SENHA
    // =========================================================================

    /// E-mail desconhecido também termina em `Ok`: a resposta não revela
    /// quem tem conta.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            tracing::info!("pedido de redefinição para e-mail sem conta");
            return Ok(());
        };

        let token = new_account_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        let mut tx = self.pool.begin().await?;
        self.account_repo
            .replace_reset_token(&mut tx, user.id, &token, expires_at)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "🔑 Link de redefinição de senha emitido");
        self.notifications
            .password_reset(&user, &reset_link(&self.public_base_url, &token));
        Ok(())
    }

    pub async fn verify_reset_token(&self, token: &str) -> Result<ResetTokenOwner, AppError> {
        let row = self
            .account_repo
            .find_reset_token(&self.pool, token)
            .await?
            .ok_or(AppError::BadRequest(Msg::InvalidAccountToken))?;

        if let Some(problem) = reset_token_problem(row.expires_at, row.used_at, Utc::now()) {
            if problem == Msg::TokenExpired {
                self.account_repo.delete_reset_token(&self.pool, row.id).await?;
            }
            return Err(AppError::BadRequest(problem));
        }

        let user = self
            .user_repo
            .find_by_id(row.user_id)
            .await?
            .ok_or(AppError::BadRequest(Msg::InvalidAccountToken))?;
        Ok(ResetTokenOwner {
            email: user.email,
            name: user.name,
        })
    }

    pub async fn reset_password(&self, payload: ResetPasswordPayload) -> Result<(), AppError> {
        let hashed_password = hash_password(payload.new_password).await?;

        let mut tx = self.pool.begin().await?;

        // 1. Trava o token: redefinições concorrentes ficam em fila
        let row = self
            .account_repo
            .lock_reset_token(&mut *tx, payload.token.trim())
            .await?
            .ok_or(AppError::BadRequest(Msg::InvalidAccountToken))?;

        // 2. Token vencido é apagado; já usado só é recusado
        if let Some(problem) = reset_token_problem(row.expires_at, row.used_at, Utc::now()) {
            if problem == Msg::TokenExpired {
                self.account_repo.delete_reset_token(&mut *tx, row.id).await?;
                tx.commit().await?;
            }
            return Err(AppError::BadRequest(problem));
        }

        // 3. Senha nova + token consumido
        self.user_repo
            .update_password(&mut *tx, row.user_id, &hashed_password)
            .await?;
        self.account_repo.mark_reset_used(&mut *tx, row.id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %row.user_id, "🔑 Senha redefinida");
        Ok(())
    }

    // =========================================================================
    //  VERIFICAÇÃO DE E-MAIL
    // =========================================================================

    /// Gera um token novo (apagando os anteriores) e envia o link.
    pub async fn issue_verification(&self, user: &User) -> Result<(), AppError> {
        let token = new_account_token();
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);

        let mut tx = self.pool.begin().await?;
        self.account_repo
            .replace_verification_token(&mut tx, user.id, &token, expires_at)
            .await?;
        tx.commit().await?;

        self.notifications
            .email_verification(user, &verification_link(&self.public_base_url, &token));
        Ok(())
    }

    /// Envio pedido pelo próprio usuário logado.
    pub async fn send_verification(&self, user: &User) -> Result<(), AppError> {
        if user.email_verified {
            return Err(AppError::BadRequest(Msg::EmailAlreadyVerified));
        }
        self.issue_verification(user).await
    }

    /// Reenvio público. Conta inexistente ou já verificada termina em `Ok`
    /// sem enviar nada.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AppError> {
        match self.user_repo.find_by_email(email.trim()).await? {
            Some(user) if !user.email_verified => self.issue_verification(&user).await,
            _ => Ok(()),
        }
    }

    pub async fn verify_email(&self, token: &str) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = self
            .account_repo
            .lock_verification_token(&mut *tx, token.trim())
            .await?
            .ok_or(AppError::BadRequest(Msg::InvalidAccountToken))?;

        if Utc::now() > row.expires_at {
            self.account_repo.delete_verification_tokens(&mut *tx, row.user_id).await?;
            tx.commit().await?;
            return Err(AppError::BadRequest(Msg::TokenExpired));
        }

        let verified = self.user_repo.mark_email_verified(&mut *tx, row.user_id).await?;
        self.account_repo.delete_verification_tokens(&mut *tx, row.user_id).await?;
        tx.commit().await?;

        let user = verified.ok_or(AppError::BadRequest(Msg::EmailAlreadyVerified))?;
        tracing::info!(user_id = %user.id, "✉️ E-mail verificado");
        Ok(user)
    }

    // =========================================================================
    //  HISTÓRICO DE LOGIN
    // =========================================================================

    /// Grava a tentativa. Falha aqui não pode derrubar o login: só vai pro log.
    pub async fn record_login(&self, user_id: Uuid, client: &ClientInfo, failure: Option<&str>) {
        if let Err(e) = self.try_record_login(user_id, client, failure).await {
            tracing::warn!(user_id = %user_id, error = ?e, "histórico de login não gravado");
        }
    }

    async fn try_record_login(
        &self,
        user_id: Uuid,
        client: &ClientInfo,
        failure: Option<&str>,
    ) -> Result<LoginHistoryEntry, AppError> {
        let info = parse_user_agent(&client.user_agent);
        let known = self
            .account_repo
            .known_device(user_id, info.browser, info.os, info.device)
            .await?;
        let status = match failure {
            None => LoginStatus::Success,
            Some(_) => LoginStatus::Failed,
        };

        let entry = self
            .account_repo
            .insert_login(&NewLogin {
                user_id,
                ip_address: &client.ip_address,
                user_agent: &client.user_agent,
                browser: info.browser,
                os: info.os,
                device: info.device,
                status,
                failure_reason: failure,
                is_new_device: !known,
            })
            .await?;

        if entry.is_new_device && status == LoginStatus::Success {
            tracing::info!(
                user_id = %user_id,
                browser = info.browser,
                os = info.os,
                device = info.device,
                "🆕 Login a partir de um dispositivo novo"
            );
        }
        Ok(entry)
    }

    pub async fn login_history(&self, user_id: Uuid, page: PageRequest) -> Result<Page<LoginHistoryEntry>, AppError> {
        let (items, total) = tokio::try_join!(
            self.account_repo.list_logins(user_id, page),
            self.account_repo.count_logins(user_id)
        )?;
        Ok(Page::new(items, total, page))
    }

    pub async fn recent_failed_logins(&self, user_id: Uuid) -> Result<Vec<LoginHistoryEntry>, AppError> {
        self.account_repo.recent_failed(user_id, RECENT_FAILED_LOGINS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppState, models::auth::RegisterUserPayload};

    const CHROME_WINDOWS: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                                Chrome/126.0 Safari/537.36 Edg/126.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 \
                                 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) \
                                  Chrome/126.0 Mobile Safari/537.36";

    #[test]
    fn user_agents_are_classified_by_the_most_specific_marker() {
        assert_eq!(
            parse_user_agent(CHROME_WINDOWS),
            DeviceInfo { browser: "Chrome", os: "Windows", device: "Desktop" }
        );
        assert_eq!(parse_user_agent(EDGE_WINDOWS).browser, "Edge");
        assert_eq!(
            parse_user_agent(SAFARI_IPHONE),
            DeviceInfo { browser: "Safari", os: "iOS", device: "Mobile" }
        );
        assert_eq!(
            parse_user_agent(CHROME_ANDROID),
            DeviceInfo { browser: "Chrome", os: "Android", device: "Mobile" }
        );
        assert_eq!(
            parse_user_agent("unknown"),
            DeviceInfo { browser: "Unknown", os: "Unknown", device: "Desktop" }
        );
    }

    #[test]
    fn reset_token_checks_expiry_before_use() {
        let now = Utc::now();
        let later = now + Duration::minutes(30);
        let earlier = now - Duration::minutes(1);

        assert_eq!(reset_token_problem(later, None, now), None);
        assert_eq!(reset_token_problem(later, Some(earlier), now), Some(Msg::TokenAlreadyUsed));
        assert_eq!(reset_token_problem(earlier, None, now), Some(Msg::TokenExpired));
        assert_eq!(reset_token_problem(earlier, Some(earlier), now), Some(Msg::TokenExpired));
    }

    #[test]
    fn tokens_are_long_hex_and_links_have_no_double_slash() {
        let token = new_account_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, new_account_token());

        assert_eq!(reset_link("https://app.example.com/", "t"), "https://app.example.com/reset-password/t");
        assert_eq!(verification_link("http://localhost:5173", "t"), "http://localhost:5173/verify-email/t");
    }

    // =========================================================================
    //  COM BANCO
    // =========================================================================

    fn client(user_agent: &str) -> ClientInfo {
        ClientInfo {
            ip_address: "203.0.113.7".into(),
            user_agent: user_agent.into(),
        }
    }

    async fn register(state: &AppState) -> User {
        state
            .auth_service
            .register_user(RegisterUserPayload {
                name: "Somchai".into(),
                email: "somchai@example.com".into(),
                password: "senha-antiga".into(),
            })
            .await
            .unwrap()
            .user
    }

    async fn stored_token(pool: &PgPool, table: &str, user_id: Uuid) -> String {
        sqlx::query_scalar(&format!("SELECT token FROM {table} WHERE user_id = $1"))
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn reset_token_changes_the_password_once(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let user = register(&state).await;
        let account = &state.account_service;

        account.request_password_reset(" SOMCHAI@example.com ").await.unwrap();
        let token = stored_token(&pool, "password_reset_tokens", user.id).await;
        assert_eq!(account.verify_reset_token(&token).await.unwrap().email, "somchai@example.com");

        let reset = |password: &str| ResetPasswordPayload {
            token: token.clone(),
            new_password: password.into(),
        };
        account.reset_password(reset("senha-nova")).await.unwrap();

        let err = account.reset_password(reset("outra-senha")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(Msg::TokenAlreadyUsed)));

        let info = client(CHROME_WINDOWS);
        assert!(matches!(
            state.auth_service.login_user("somchai@example.com", "senha-antiga", &info).await,
            Err(AppError::InvalidCredentials)
        ));
        state
            .auth_service
            .login_user("somchai@example.com", "senha-nova", &info)
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn unknown_email_and_expired_token_reveal_nothing(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let user = register(&state).await;
        let account = &state.account_service;

        account.request_password_reset("ninguem@example.com").await.unwrap();
        account.request_password_reset("somchai@example.com").await.unwrap();
        let token = stored_token(&pool, "password_reset_tokens", user.id).await;

        sqlx::query("UPDATE password_reset_tokens SET expires_at = NOW() - INTERVAL '1 minute'")
            .execute(&pool)
            .await
            .unwrap();
        let err = account.verify_reset_token(&token).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(Msg::TokenExpired)));

        // vencido é apagado
        let err = account.verify_reset_token(&token).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(Msg::InvalidAccountToken)));
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn registration_token_verifies_the_email(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let user = register(&state).await;
        assert!(!user.email_verified);
        let account = &state.account_service;

        let token = stored_token(&pool, "email_verification_tokens", user.id).await;
        let verified = account.verify_email(&token).await.unwrap();
        assert!(verified.email_verified);
        assert!(verified.email_verified_at.is_some());

        // token consumido; novos pedidos não fazem nada
        let err = account.verify_email(&token).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(Msg::InvalidAccountToken)));
        let err = account.send_verification(&verified).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(Msg::EmailAlreadyVerified)));
        account.resend_verification("somchai@example.com").await.unwrap();

        let pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_verification_tokens")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(pending, 0);
    }

    #[sqlx::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn login_attempts_are_recorded_with_new_device_flag(pool: PgPool) {
        let state = AppState::for_tests(pool.clone());
        let user = register(&state).await;
        let auth = &state.auth_service;

        let desktop = client(CHROME_WINDOWS);
        let phone = client(SAFARI_IPHONE);
        auth.login_user("somchai@example.com", "errada", &desktop).await.unwrap_err();
        auth.login_user("somchai@example.com", "senha-antiga", &desktop).await.unwrap();
        auth.login_user("somchai@example.com", "senha-antiga", &desktop).await.unwrap();
        auth.login_user("somchai@example.com", "senha-antiga", &phone).await.unwrap();
        // e-mail sem conta não tem a quem atribuir a tentativa
        auth.login_user("ninguem@example.com", "x", &desktop).await.unwrap_err();

        let account = &state.account_service;
        let page = account
            .login_history(user.id, PageRequest::from_raw(None, None))
            .await
            .unwrap();
        assert_eq!(page.meta.total, 4);

        // mais recente primeiro
        let flags: Vec<(LoginStatus, bool)> = page.items.iter().map(|e| (e.status, e.is_new_device)).collect();
        assert_eq!(
            flags,
            vec![
                (LoginStatus::Success, true),
                (LoginStatus::Success, false),
                (LoginStatus::Success, true),
                (LoginStatus::Failed, true),
            ]
        );
        assert_eq!(page.items[0].os, "iOS");
        assert_eq!(page.items[3].ip_address, "203.0.113.7");

        let failed = account.recent_failed_logins(user.id).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].failure_reason.as_deref(), Some("wrong password"));
    }
}
