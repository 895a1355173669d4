//! Tools module aggregator.
//!
//! Function signatures, their handlers, the registry that names them, and
//! the concrete tools the profile bot exposes.

mod definition;
mod params;
mod profile;
mod registry;

pub use definition::{FunctionSignature, ToolDefinition, ToolHandler};
pub use params::{ToolParameters, ToolParametersBuilder};
pub use profile::{
    build_record_unknown_question_tool,
    build_record_user_details_tool,
    profile_registry,
    RECORD_UNKNOWN_QUESTION,
    RECORD_USER_DETAILS,
};
pub use registry::ToolRegistry;
