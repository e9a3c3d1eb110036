// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{
        normalize_username, ChangePasswordPayload, Claims, CreateUserPayload, TokenKind,
        TokenPair, UpdateUserPayload, User, UserRole,
    },
    services::rbac_service::RbacService,
};

/// Emite e valida os JWTs (HS256). Access e refresh só diferem no `kind` e na validade.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: String, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self { secret, access_ttl, refresh_ttl }
    }

    pub fn issue(&self, user_id: Uuid, role: UserRole, kind: TokenKind) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user_id,
            role,
            kind,
            exp: expires_at.timestamp().max(0) as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    /// Decodifica e exige o tipo esperado: refresh token não serve como bearer.
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        if data.claims.kind != expected {
            return Err(AppError::InvalidToken);
        }
        Ok(data.claims)
    }

    fn pair_for(&self, user: User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access: self.issue(user.id, user.role, TokenKind::Access)?,
            refresh: self.issue(user.id, user.role, TokenKind::Refresh)?,
            user,
        })
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    rbac_service: RbacService,
    tokens: TokenIssuer,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        rbac_service: RbacService,
        tokens: TokenIssuer,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, rbac_service, tokens, pool }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .user_repo
            .find_by_username(&normalize_username(username))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        // Só depois da senha, para não revelar quais contas existem
        if !user.is_active {
            return Err(AppError::UserInactive);
        }

        self.user_repo.touch_last_login(user.id).await?;
        tracing::info!("Login de '{}'", user.username);
        self.tokens.pair_for(user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.tokens.decode(refresh_token, TokenKind::Refresh)?;
        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::UserInactive);
        }
        self.tokens.pair_for(user)
    }

    /// Usado pelo auth_guard: só aceita access tokens.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.decode(token, TokenKind::Access)?;
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Cria o primeiro ADMIN quando a tabela de usuários está vazia.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<Option<User>, AppError> {
        if self.user_repo.count_users().await? > 0 {
            return Ok(None);
        }

        let hashed_password = hash_password(password).await?;
        let admin = self
            .user_repo
            .create_user(
                &self.pool,
                &normalize_username(username),
                &hashed_password,
                None,
                None,
                None,
                UserRole::Admin,
            )
            .await?;

        tracing::info!("👤 Usuário administrador '{}' criado", admin.username);
        Ok(Some(admin))
    }

    pub async fn create_user(&self, payload: &CreateUserPayload, created_by: Uuid) -> Result<User, AppError> {
        // 1. Hashing fora da transação
        let hashed_password = hash_password(&payload.password).await?;

        // 2. Usuário + permissões padrão do cargo, tudo ou nada
        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                &normalize_username(&payload.username),
                &hashed_password,
                payload.email.as_deref(),
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                payload.role,
            )
            .await?;

        self.rbac_service
            .grant_defaults_in(&mut *tx, user.id, user.role, Some(created_by))
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_users().await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn update_user(&self, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        self.user_repo
            .update_user(id, payload)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn change_password(&self, id: Uuid, payload: &ChangePasswordPayload) -> Result<(), AppError> {
        let hashed_password = hash_password(&payload.new_password).await?;
        if !self.user_repo.set_password(id, &hashed_password).await? {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("segredo-de-teste".into(), Duration::minutes(60), Duration::days(7))
    }

    #[test]
    fn access_token_round_trips_claims() {
        let tokens = issuer();
        let id = Uuid::new_v4();
        let token = tokens.issue(id, UserRole::Cashier, TokenKind::Access).unwrap();
        let claims = tokens.decode(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, UserRole::Cashier);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_is_not_a_bearer_token() {
        let tokens = issuer();
        let token = tokens.issue(Uuid::new_v4(), UserRole::Server, TokenKind::Refresh).unwrap();
        assert!(matches!(
            tokens.decode(&token, TokenKind::Access),
            Err(AppError::InvalidToken)
        ));
        assert!(tokens.decode(&token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = issuer().issue(Uuid::new_v4(), UserRole::Admin, TokenKind::Access).unwrap();
        let other = TokenIssuer::new("outro".into(), Duration::minutes(60), Duration::days(7));
        assert!(other.decode(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenIssuer::new("segredo".into(), Duration::hours(-2), Duration::days(7));
        let token = tokens.issue(Uuid::new_v4(), UserRole::Cook, TokenKind::Access).unwrap();
        assert!(matches!(
            tokens.decode(&token, TokenKind::Access),
            Err(AppError::InvalidToken)
        ));
    }
}
