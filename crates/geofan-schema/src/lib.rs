pub mod node;
pub mod validator;

pub use node::{RequiredMode, SchemaNode};
pub use validator::{apply_defaults, resolve_required, validate_query, validate_value};
