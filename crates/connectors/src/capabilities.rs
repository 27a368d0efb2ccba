use sql_syntax::ast::field::{FuncCall, FuncKind, FuncParam};

/// A source's answer to "can you evaluate this call yourself?".
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionSupport {
    /// The source executes the call; `rendered` is the source-dialect
    /// expression to splice into the projection.
    Pushdown { rendered: String },
    /// The platform evaluates the call after fetching its inputs.
    Platform,
}

/// Per-source-class capability module consulted by the classifier.
pub trait FunctionCapability: Send + Sync {
    fn supports(&self, call: &FuncCall) -> FunctionSupport;
}

/// Refuses every call. Flat files and REST mappings cannot evaluate
/// functions, so everything lands on the platform.
pub struct ForceAll;

impl FunctionCapability for ForceAll {
    fn supports(&self, _call: &FuncCall) -> FunctionSupport {
        FunctionSupport::Platform
    }
}

/// Capability module for relational sources. Only plain scalar calls over a
/// single column are rendered; aggregates and varargs stay on the platform
/// so their null and grouping semantics are the engine's, not the
/// source's.
pub struct RelationalFunctions;

impl FunctionCapability for RelationalFunctions {
    fn supports(&self, call: &FuncCall) -> FunctionSupport {
        if call.kind != FuncKind::Scalar {
            return FunctionSupport::Platform;
        }
        match call.params.as_slice() {
            [FuncParam::Field { src, field }] => FunctionSupport::Pushdown {
                rendered: format!("{}({}.{})", call.name.sql(), src, field),
            },
            _ => FunctionSupport::Platform,
        }
    }
}
