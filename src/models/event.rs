// src/models/event.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// Mapeia o CREATE TYPE deal_event_kind do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "deal_event_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealEventKind {
    /// Recalcula as etiquetas do cliente
    GenerateTags,
    /// Envia o contato para o TalkBI
    SyncCrm,
}

// Linha do outbox. Gravada na mesma transação da mudança de estado.
#[derive(Debug, Clone, FromRow)]
pub struct DealEvent {
    pub id: Uuid,
    pub kind: DealEventKind,
    pub client_id: Uuid,
    pub deal_id: Option<Uuid>,
    pub attempts: i32,
}

/// Depois dessa quantidade de falhas o evento é abandonado.
pub const MAX_ATTEMPTS: i32 = 5;

/// Tempo que um lote fica reservado para o worker que o pegou. Se o processo
/// morrer no meio, os eventos voltam para a fila depois disso.
pub const CLAIM_LEASE_SECS: f64 = 300.0;

impl DealEvent {
    pub fn is_last_attempt(&self) -> bool {
        self.attempts + 1 >= MAX_ATTEMPTS
    }
}
