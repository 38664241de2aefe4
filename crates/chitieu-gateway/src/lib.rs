//! Webhook gateway for the chitieu bot — axum HTTP server
//!
//! Exposes the health endpoints and the secret-bearing Telegram webhook.
//! This is one of the two transports; deployments run either this server or
//! the long poller, never both.

pub mod server;

pub use server::{GatewayState, WebhookServer};
