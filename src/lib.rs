//! jr-kafka-bridge - local transport to Kafka bridge
//!
//! Accepts one-shot `key|header|message` requests on a Unix domain socket,
//! loopback TCP socket, or named pipe, and produces each message to a fixed
//! Kafka topic with a bounded synchronous delivery wait.

pub mod bridge;
pub mod config;
pub mod lifecycle;
pub mod sink;
pub mod transport;
pub mod wire;
