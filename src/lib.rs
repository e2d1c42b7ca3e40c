pub mod admin;
pub mod api;
pub mod app;
pub mod browser;
pub mod config;
pub mod error;
pub mod processing;
pub mod upload;
pub mod utils;
