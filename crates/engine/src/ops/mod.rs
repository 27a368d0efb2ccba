pub mod filter;
pub mod group;
pub mod join;
pub mod limit;
pub mod order;
pub mod project;
pub mod scalar;
