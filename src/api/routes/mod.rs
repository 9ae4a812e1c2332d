//! API route modules.

pub mod webhook;
