pub mod actions;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod deals;
pub mod settings;
