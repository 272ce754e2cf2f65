use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::deal::DealStatus;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Não autorizado")]
    Unauthorized,

    #[error("Acesso restrito a administradores")]
    Forbidden,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    // A mensagem já vem pronta: "Cotação não encontrada", "Venda não encontrada"...
    #[error("{0}")]
    NotFound(String),

    #[error("Já existe uma negociação com o código {0}")]
    DuplicateCode(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Ação não reconhecida: {0}")]
    UnknownAction(String),

    #[error("Transição de status inválida: {from} → {to}")]
    InvalidTransition { from: DealStatus, to: DealStatus },

    // Falha dentro da transação de conversão. O detalhe vai para o log.
    #[error("Falha em todos os métodos de conversão.")]
    ConversionFailed(#[source] Box<AppError>),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro na integração externa: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::UnknownAction(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists | AppError::DuplicateCode(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::HttpError(_) => StatusCode::BAD_GATEWAY,
            AppError::ConversionFailed(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidToken => "Não autorizado".to_string(),
            AppError::InvalidCredentials => "E-mail ou senha inválidos.".to_string(),
            AppError::EmailAlreadyExists => "Este e-mail já está em uso.".to_string(),

            AppError::ConversionFailed(ref source) => {
                tracing::error!("Falha na conversão de status: {}", source);
                self.to_string()
            }

            // Erros de negócio: a mensagem do `thiserror` já é a mensagem do usuário.
            ref e if !status.is_server_error() && status != StatusCode::BAD_GATEWAY => e.to_string(),

            // O resto vira uma mensagem genérica. O detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_keep_their_status() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound("Cotação não encontrada".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::DuplicateCode("COT-1".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::UnknownAction("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidTransition {
                from: DealStatus::Finalized,
                to: DealStatus::Pending
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn unauthorized_message_is_portuguese() {
        assert_eq!(AppError::Unauthorized.to_string(), "Não autorizado");
    }

    #[test]
    fn conversion_failure_hides_the_cause() {
        let err = AppError::ConversionFailed(Box::new(AppError::DatabaseError(sqlx::Error::RowNotFound)));
        assert_eq!(err.to_string(), "Falha em todos os métodos de conversão.");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn database_errors_are_internal() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
