use chrono::{DateTime, Utc};

/// Something that happened to an order, published after it was stored.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name consumers route on, e.g. `orders.order.status_changed`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version; bump when fields change meaning.
    fn version(&self) -> u32;

    fn occurred_at(&self) -> DateTime<Utc>;
}
