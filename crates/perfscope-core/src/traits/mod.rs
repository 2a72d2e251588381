//! Trait seams between the engine and its collaborators.

pub mod cancellation;
pub mod key_value_store;

pub use cancellation::{Cancellable, CancellationToken};
pub use key_value_store::{KeyValueStore, KeyValueStoreExt};
