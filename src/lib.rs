// Public modules
pub mod chat;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod observability;
pub mod params;
pub mod reveal;
pub mod types;

// Re-exports
pub use client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, QueryClient};
pub use dispatcher::{Dispatcher, HttpDispatcher};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use params::{ParameterName, ParameterStore, QueryParameters};
pub use reveal::{RevealHandle, RevealScheduler};
pub use types::*;
