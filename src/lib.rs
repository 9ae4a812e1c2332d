pub mod api;
pub mod app;
pub mod attendance;
pub mod cli;
pub mod config;
pub mod global;
pub mod provider;
pub mod sheets;
pub mod webhook;
