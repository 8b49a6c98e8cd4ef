use crate::gateway::Collection;

/// Change notifications for the presentation layer.
///
/// Events carry no data; read the new state from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A collection snapshot was replaced by a reload or a live push.
    CollectionReplaced(Collection),
    /// The bulk-load flag changed.
    LoadingChanged(bool),
    /// The error slot was set or cleared.
    ErrorChanged(Option<String>),
}
