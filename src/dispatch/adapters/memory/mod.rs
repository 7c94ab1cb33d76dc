//! In-memory adapters.

mod loader;
mod transport;

pub use loader::StaticCommandLoader;
pub use transport::{InMemoryTransport, OutboxEntry};
