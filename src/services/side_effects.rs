// src/services/side_effects.rs
//
// Consumidor do outbox (`deal_events`). As operações de negociação só gravam o
// evento; quem executa etiquetas e sincronização com o TalkBI é o worker abaixo.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::{
    common::error::AppError,
    config::TalkBiConfig,
    db::{ClientRepository, EventRepository},
    models::{
        client::{Client, ClientDealStats},
        event::{DealEvent, DealEventKind},
    },
};

// Eventos por rodada do worker
const BATCH_SIZE: i64 = 20;

#[async_trait]
pub trait SideEffectHandler: Send + Sync {
    fn kind(&self) -> DealEventKind;
    async fn handle(&self, event: &DealEvent) -> Result<(), AppError>;
}

// =============================================================================
//  ETIQUETAS
// =============================================================================

/// "Alimentício / Bebidas" -> "alimenticio-bebidas"
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        let plain = match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            c if c.is_ascii_alphanumeric() => c,
            _ => '-',
        };
        if plain == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(plain);
    }
    slug.trim_end_matches('-').to_string()
}

pub fn derive_tags(client: &Client, stats: &ClientDealStats) -> Vec<String> {
    let mut tags = Vec::new();

    let segment = slugify(&client.segment);
    if !segment.is_empty() {
        tags.push(segment);
    }
    if client.recurring {
        tags.push("recorrente".to_string());
    }
    if stats.sales > 0 {
        tags.push("cliente-ativo".to_string());
    }
    if stats.pending > 0 {
        tags.push("em-negociacao".to_string());
    }
    if stats.lost > 0 && stats.sales == 0 {
        tags.push("perdido".to_string());
    }
    if stats.sales_total >= Decimal::from(50_000) {
        tags.push("alto-valor".to_string());
    }
    tags
}

#[derive(Clone)]
pub struct TagGenerator {
    pool: PgPool,
    client_repo: ClientRepository,
}

impl TagGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, client_repo: ClientRepository::new() }
    }
}

#[async_trait]
impl SideEffectHandler for TagGenerator {
    fn kind(&self) -> DealEventKind {
        DealEventKind::GenerateTags
    }

    async fn handle(&self, event: &DealEvent) -> Result<(), AppError> {
        let Some(client) = self.client_repo.find_by_id(&self.pool, event.client_id).await? else {
            // Cliente removido depois do evento: nada a fazer
            return Ok(());
        };

        let stats = self.client_repo.deal_stats(&self.pool, client.id).await?;
        let tags = derive_tags(&client, &stats);
        self.client_repo.update_tags(&self.pool, client.id, &tags).await?;

        tracing::debug!("🏷️ Etiquetas de {}: {:?}", client.name, tags);
        Ok(())
    }
}

// =============================================================================
//  TALKBI
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkBiContact<'a> {
    pub name: &'a str,
    pub whatsapp: &'a str,
    pub cnpj: &'a str,
    pub segment: &'a str,
    pub tags: &'a [String],
}

impl<'a> TalkBiContact<'a> {
    /// Sem WhatsApp não há contato para sincronizar.
    pub fn from_client(client: &'a Client) -> Option<Self> {
        let whatsapp = client.whatsapp.as_deref().filter(|w| !w.trim().is_empty())?;
        Some(Self {
            name: &client.name,
            whatsapp,
            cnpj: &client.cnpj,
            segment: &client.segment,
            tags: &client.tags,
        })
    }
}

#[derive(Clone)]
pub struct TalkBiSync {
    pool: PgPool,
    client_repo: ClientRepository,
    http: reqwest::Client,
    config: Option<TalkBiConfig>,
}

impl TalkBiSync {
    pub fn new(pool: PgPool, config: Option<TalkBiConfig>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { pool, client_repo: ClientRepository::new(), http, config }
    }
}

#[async_trait]
impl SideEffectHandler for TalkBiSync {
    fn kind(&self) -> DealEventKind {
        DealEventKind::SyncCrm
    }

    async fn handle(&self, event: &DealEvent) -> Result<(), AppError> {
        let Some(config) = &self.config else {
            tracing::info!("TalkBI não configurado; sincronização do cliente {} ignorada", event.client_id);
            return Ok(());
        };

        let Some(client) = self.client_repo.find_by_id(&self.pool, event.client_id).await? else {
            return Ok(());
        };
        let Some(contact) = TalkBiContact::from_client(&client) else {
            tracing::debug!("Cliente {} sem WhatsApp; nada a enviar ao TalkBI", client.name);
            return Ok(());
        };

        self.http
            .post(&config.url)
            .bearer_auth(&config.token)
            .json(&contact)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("📤 Cliente {} sincronizado com o TalkBI", client.name);
        Ok(())
    }
}

// =============================================================================
//  WORKER
// =============================================================================

#[derive(Clone)]
pub struct OutboxWorker {
    pool: PgPool,
    event_repo: EventRepository,
    handlers: Vec<Arc<dyn SideEffectHandler>>,
    poll_every: Duration,
}

impl OutboxWorker {
    pub fn new(pool: PgPool, poll_every: Duration) -> Self {
        Self { pool, event_repo: EventRepository::new(), handlers: Vec::new(), poll_every }
    }

    pub fn with_handler(mut self, handler: Arc<dyn SideEffectHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("📬 Worker do outbox iniciado (a cada {:?})", self.poll_every);
            let mut ticker = tokio::time::interval(self.poll_every);
            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Outbox: {} evento(s) processado(s)", n),
                    Err(e) => tracing::error!("🔥 Falha ao processar o outbox: {:?}", e),
                }
            }
        })
    }

    /// Uma rodada: reserva um lote, executa cada evento fora de transação e
    /// grava o resultado de cada um separadamente. Uma falha ao gravar não
    /// devolve à fila os eventos que já foram concluídos.
    pub async fn run_once(&self) -> Result<usize, AppError> {
        let events = self.event_repo.claim_pending(&self.pool, BATCH_SIZE).await?;

        for event in &events {
            let recorded = match self.dispatch(event).await {
                Ok(()) => self.event_repo.mark_processed(&self.pool, event.id).await,
                Err(e) => {
                    let give_up = event.is_last_attempt();
                    tracing::warn!(
                        "Evento {:?} {} (negociação {:?}) falhou (tentativa {}): {}",
                        event.kind, event.id, event.deal_id, event.attempts + 1, e
                    );
                    if give_up {
                        tracing::error!("Evento {} abandonado após {} tentativas", event.id, event.attempts + 1);
                    }
                    self.event_repo
                        .record_failure(&self.pool, event.id, &e.to_string(), give_up)
                        .await
                }
            };

            // O evento segue reservado até o fim do lease e volta para a fila depois
            if let Err(e) = recorded {
                tracing::error!("🔥 Não foi possível registrar o resultado do evento {}: {:?}", event.id, e);
            }
        }

        Ok(events.len())
    }

    async fn dispatch(&self, event: &DealEvent) -> Result<(), AppError> {
        let handler = self
            .handlers
            .iter()
            .find(|h| h.kind() == event.kind)
            .ok_or_else(|| anyhow::anyhow!("Nenhum handler para o evento {:?}", event.kind))?;
        handler.handle(event).await
    }
}
