pub mod auth;
pub mod client;
pub mod dashboard;
pub mod deal;
pub mod event;
pub mod product;
pub mod settings;
