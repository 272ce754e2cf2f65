// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser};

/// Guardião das rotas administrativas. Só funciona atrás do `auth_guard`.
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;

        // B. Verifica o papel (vem do token, sem ida ao banco)
        if !user.0.is_admin() {
            return Err(AppError::Forbidden);
        }

        Ok(RequireAdmin(user))
    }
}
