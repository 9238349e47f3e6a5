//! Durable work-queue publishing and peek-lock consumption.

pub mod connection;
pub mod error;
pub mod memory;
pub mod publisher;
pub mod service_bus;
pub mod transport;

pub use {
    connection::ConnectionString,
    error::{Error, Result},
    memory::InMemoryQueue,
    publisher::{DequeueOutcome, PublishOutcome, QueuePublisher},
    service_bus::ServiceBusQueue,
    transport::{QueueTransport, ReceivedEntry},
};
