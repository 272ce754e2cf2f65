pub mod action_service;
pub mod auth;
pub mod catalog_service;
pub mod dashboard_service;
pub mod deal_service;
pub mod side_effects;
