// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use super::account_service::AccountService;
use crate::{
    common::error::AppError,
    db::UserRepository,
    middleware::client::ClientInfo,
    models::auth::{AuthResponse, Claims, RegisterUserPayload, User},
};

// Motivo gravado no histórico quando a senha não confere
const WRONG_PASSWORD: &str = "wrong password";

/// bcrypt em thread bloqueante (CPU pesado, não toca no banco).
pub async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Assina o token de acesso do usuário.
pub fn encode_token(user: &User, secret: &str, expires_days: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::days(expires_days);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

/// Confere assinatura e expiração. Qualquer falha vira `InvalidToken`.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    jwt_expires_days: i64,
    account: AccountService,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        jwt_secret: String,
        jwt_expires_days: i64,
        account: AccountService,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            jwt_secret,
            jwt_expires_days,
            account,
            pool,
        }
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<AuthResponse, AppError> {
        // 1. Hashing fora da transação
        let hashed_password = hash_password(payload.password).await?;

        // 2. Cria o usuário (e-mail duplicado vira EmailAlreadyExists no repo)
        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create_user(&mut *tx, payload.name.trim(), payload.email.trim(), &hashed_password)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, "👤 Novo usuário registrado");

        // 3. Link de verificação; a conta já existe mesmo se isto falhar
        if let Err(e) = self.account.issue_verification(&user).await {
            tracing::warn!(user_id = %user.id, error = ?e, "verificação de e-mail não emitida no registro");
        }

        let token = encode_token(&user, &self.jwt_secret, self.jwt_expires_days)?;
        Ok(AuthResponse { token, user })
    }

    /// Tentativas com e-mail cadastrado entram no histórico de login.
    pub async fn login_user(&self, email: &str, password: &str, client: &ClientInfo) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            self.account.record_login(user.id, client, Some(WRONG_PASSWORD)).await;
            return Err(AppError::InvalidCredentials);
        }
        self.account.record_login(user.id, client, None).await;

        let token = encode_token(&user, &self.jwt_secret, self.jwt_expires_days)?;
        Ok(AuthResponse { token, user })
    }

    /// Valida o token e recarrega o usuário (o papel pode ter mudado).
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            name: "Owner".into(),
            password_hash: "x".into(),
            role,
            email_verified: false,
            email_verified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_carries_identity_and_role() {
        let admin = user(UserRole::Admin);
        let token = encode_token(&admin, "secret", 7).unwrap();
        let claims = decode_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.email, "owner@example.com");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_invalid_token() {
        let token = encode_token(&user(UserRole::User), "secret", 7).unwrap();
        assert!(matches!(decode_token(&token, "other"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = encode_token(&user(UserRole::User), "secret", -2).unwrap();
        assert!(matches!(decode_token(&token, "secret"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode_token("not.a.jwt", "secret"), Err(AppError::InvalidToken)));
    }
}
