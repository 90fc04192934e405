pub mod events;
pub mod memory;
pub mod postgres;

pub use events::{LogPublisher, NatsPublisher};
pub use memory::MemoryStore;
pub use postgres::PgStore;
