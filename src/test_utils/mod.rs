//! Test helpers shared by unit tests and, through the `test-util` feature,
//! by the integration tests under `tests/`.

mod collecting_handler;
mod mock_broker;

pub use collecting_handler::CollectingSink;
pub use mock_broker::{Declaration, MockBroker, PublishedMessage};
