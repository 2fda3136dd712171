//! Real-time event bus for entity change notifications.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope delivered to subscribers.

pub mod bus;

pub use bus::{EventBus, PlatformEvent};
