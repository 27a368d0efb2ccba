pub mod compare;
pub mod error;
pub mod fetch;
pub mod ops;
pub mod pipeline;
pub mod spill;
pub mod table;

pub use error::EngineError;
pub use pipeline::{execute, PlanRecorder};
pub use spill::write_spill;
pub use table::TableData;
