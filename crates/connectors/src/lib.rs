pub mod adapter;
pub mod capabilities;
pub mod coerce;
pub mod error;
pub mod file;
pub mod kerberos;
pub mod registry;
pub mod relational;
pub mod request;
pub mod result_path;
pub mod spec;
pub mod web;

pub use adapter::Connector;
pub use error::{ConnectorError, FetchError};
pub use registry::{ConnectorClass, ConnectorEntry, ConnectorRegistry};
pub use request::{FetchAttribute, FetchRequest, ResultHandle, RowIter};
pub use spec::{DataSourceSpec, EndpointSpec, ModelSpec};
