//! HTTP surface and orchestration for the webhook relay.
//!
//! A webhook names a message by `(channel_id, timestamp)`. The relay fetches
//! it, copies a supported attachment to blob storage, and publishes a
//! [`courier_common::NormalizedMessage`] to the work queue.

pub mod pipeline;
pub mod server;
pub mod services;

pub use {
    pipeline::{Relay, RelayError, RelayOutcome, RelayStage},
    server::{build_app, start_server},
    services::RelayServices,
};
