pub mod config;
pub mod error;
pub mod lifecycle;
pub mod store;

pub use config::Config;
pub use error::RuntimeError;
pub use lifecycle::{spawn_sweeper, QueryService};
pub use store::{SledMetadataStore, StoreError};
