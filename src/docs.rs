// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Quotes ---
        handlers::deals::create_quote,
        handlers::deals::list_quotes,
        handlers::deals::get_quote,
        handlers::deals::update_quote,
        handlers::deals::delete_quote,

        // --- Sales ---
        handlers::deals::list_sales,
        handlers::deals::get_sale,
        handlers::deals::list_lost_deals,
        handlers::deals::get_lost_deal,
        handlers::deals::convert_deal,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_sellers,
        handlers::dashboard::get_top_products,
        handlers::dashboard::get_top_clients,
        handlers::dashboard::get_objections,

        // --- Clients / Products ---
        handlers::catalog::list_clients,
        handlers::catalog::get_client,
        handlers::catalog::list_products,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Actions ---
        handlers::actions::run_action,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Deals ---
            models::deal::DealStatus,
            models::deal::Deal,
            models::deal::DealItem,
            models::deal::DealListEntry,
            models::deal::DealItemPayload,
            models::deal::DealPayload,
            models::deal::DealView,
            models::deal::ConvertDealPayload,
            models::deal::ConvertDealResponse,

            // --- Dashboard ---
            models::dashboard::StatusCard,
            models::dashboard::DashboardSummary,
            models::dashboard::SellerPerformance,
            models::dashboard::TopProductEntry,
            models::dashboard::TopClientEntry,
            models::dashboard::ObjectionEntry,

            // --- Clients / Products ---
            models::client::Client,
            models::client::ClientDealStats,
            models::client::ClientDetail,
            models::client::ClientFilter,
            models::product::Product,

            // --- Settings ---
            models::settings::AppSettings,
            models::settings::UpdateSettingsRequest,

            // --- Actions ---
            services::action_service::ActionRequest,
            services::action_service::ActionResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Quotes", description = "Cotações pendentes"),
        (name = "Sales", description = "Vendas, não-vendas e conversão de status"),
        (name = "Dashboard", description = "Indicadores comerciais"),
        (name = "Clients", description = "Carteira de clientes"),
        (name = "Products", description = "Catálogo de produtos"),
        (name = "Settings", description = "Configurações gerais"),
        (name = "Actions", description = "Ações em lote (exportação, normalização de WhatsApp)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
