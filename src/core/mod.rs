pub mod error;
pub mod types;
pub mod value;

pub use error::{GatewayError, Result};
pub use types::{FieldMap, field_map};
pub use value::Value;
