pub mod canonical_store;
pub mod format_observer;
pub mod lookup_provider;
pub mod registry_client;
