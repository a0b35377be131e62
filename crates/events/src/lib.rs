//! Lifecycle events and the pub/sub mechanics used to distribute them.
//!
//! Order status changes are published after they are persisted so that
//! notifiers, metrics and the HTTP layer can observe the pipeline without
//! being called from inside it.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
