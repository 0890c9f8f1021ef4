//! Relay: accumulates streamed fragments and publishes the growing reply through an edit channel.

mod publisher;
mod throttle;

pub use publisher::{Delivery, RelayOutcome, RelayPublisher, RelaySettings, MSG_EMPTY_REPLY};
pub use throttle::PublishThrottle;
