// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, Principal, RegisterUserPayload, User, UserRole},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, pool }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<String, AppError> {
        // 1. Hashing fora da transação (não toca no banco)
        let password_clone = payload.password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
            ?;

        let mut tx = self.pool.begin().await?;

        // 2. O primeiro usuário do sistema vira administrador
        self.user_repo.lock_for_registration(&mut *tx).await?;
        let role = if self.user_repo.count_users(&mut *tx).await? == 0 {
            UserRole::Admin
        } else {
            UserRole::Vendedor
        };

        let new_user = self.user_repo
            .create_user(&mut *tx, payload.name.trim(), &payload.email, &hashed_password, role)
            .await?;

        tx.commit().await?;

        tracing::info!("👤 Usuário {} registrado como {:?}", new_user.email, new_user.role);
        self.create_token(&new_user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(&user)
    }

    /// Sem ida ao banco: nome e papel viajam dentro do token.
    pub fn validate_token(&self, token: &str) -> Result<Principal, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims.into())
    }

    pub async fn find_user(&self, principal: &Principal) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(principal.id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cotacoes_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), secret.to_string(), pool)
    }

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Dora".to_string(),
            email: "dora@empresa.com.br".to_string(),
            password_hash: String::new(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn token_carries_the_principal() {
        let auth = service("segredo");
        let seller = user(UserRole::Vendedor);

        let token = auth.create_token(&seller).unwrap();
        let principal = auth.validate_token(&token).unwrap();

        assert_eq!(principal.id, seller.id);
        assert_eq!(principal.name, "Dora");
        assert!(!principal.is_admin());
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let token = service("outro").create_token(&user(UserRole::Admin)).unwrap();
        let err = service("segredo").validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn only_one_of_two_simultaneous_first_registrations_is_admin(pool: PgPool) {
        let auth = AuthService::new(UserRepository::new(pool.clone()), "segredo".to_string(), pool.clone());
        let payload = |email: &str| RegisterUserPayload {
            name: "Dora".to_string(),
            email: email.to_string(),
            password: "segredo123".to_string(),
        };
        let (first, second) = (payload("dora@empresa.com.br"), payload("eli@empresa.com.br"));

        let (a, b) = tokio::join!(auth.register_user(&first), auth.register_user(&second));
        a.unwrap();
        b.unwrap();

        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        assert!(matches!(
            service("segredo").validate_token("nao-e-um-jwt"),
            Err(AppError::InvalidToken)
        ));
    }
}
