// src/services/action_service.rs

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    db::{ClientRepository, EventRepository},
    models::{auth::Principal, client::ClientFilter, event::DealEventKind},
};

/// Ações em lote sobre a carteira de clientes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Enfileira a sincronização com o TalkBI
    Export,
    /// Normaliza os WhatsApp para 55 + DDD + número
    NormalizePrefix,
}

impl BulkAction {
    pub fn parse(acao: &str) -> Result<Self, AppError> {
        match acao.trim() {
            "exportar" => Ok(BulkAction::Export),
            "atualizar-prefixo" => Ok(BulkAction::NormalizePrefix),
            other => Err(AppError::UnknownAction(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Export => "exportar",
            BulkAction::NormalizePrefix => "atualizar-prefixo",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionRequest {
    /// "exportar" ou "atualizar-prefixo"
    #[schema(example = "exportar")]
    pub acao: String,
    #[serde(default)]
    pub filtros: ClientFilter,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub acao: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enfileirados: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atualizados: Option<usize>,
}

/// "(11) 99999-8888" -> "5511999998888". Números que já têm o 55 ficam como estão;
/// o que não parece um telefone brasileiro devolve `None`.
pub fn normalize_whatsapp(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.trim_start_matches('0');

    match digits.len() {
        // DDD + fixo (8) ou celular (9)
        10 | 11 => Some(format!("55{}", digits)),
        12 | 13 if digits.starts_with("55") => Some(digits.to_string()),
        _ => None,
    }
}

#[derive(Clone)]
pub struct ActionService {
    pool: PgPool,
    client_repo: ClientRepository,
    event_repo: EventRepository,
}

impl ActionService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            client_repo: ClientRepository::new(),
            event_repo: EventRepository::new(),
        }
    }

    pub async fn run(&self, principal: &Principal, request: ActionRequest) -> Result<ActionResponse, AppError> {
        let action = BulkAction::parse(&request.acao)?;
        let filter = request.filtros.scoped(principal);

        let response = match action {
            BulkAction::Export => ActionResponse {
                acao: action.as_str().to_string(),
                enfileirados: Some(self.export(&filter).await?),
                atualizados: None,
            },
            BulkAction::NormalizePrefix => ActionResponse {
                acao: action.as_str().to_string(),
                enfileirados: None,
                atualizados: Some(self.normalize_prefixes(&filter).await?),
            },
        };

        tracing::info!("⚡ Ação '{}' executada por {}: {:?}", response.acao, principal.name, response);
        Ok(response)
    }

    async fn export(&self, filter: &ClientFilter) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;

        let clients = self.client_repo.list(&mut *tx, filter, true).await?;
        for client in &clients {
            self.event_repo
                .enqueue(&mut *tx, DealEventKind::SyncCrm, client.id, None)
                .await?;
        }

        tx.commit().await?;
        Ok(clients.len())
    }

    async fn normalize_prefixes(&self, filter: &ClientFilter) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;

        let clients = self.client_repo.list(&mut *tx, filter, true).await?;
        let mut updated = 0;
        for client in &clients {
            let Some(current) = client.whatsapp.as_deref() else { continue };
            match normalize_whatsapp(current) {
                Some(normalized) if normalized != current => {
                    self.client_repo.update_whatsapp(&mut *tx, client.id, &normalized).await?;
                    updated += 1;
                }
                Some(_) => {}
                None => tracing::warn!("WhatsApp inválido para {}: '{}'", client.name, current),
            }
        }

        tx.commit().await?;
        Ok(updated)
    }
}
