//! Instances and the values they hold

mod instance;
mod value;

pub use instance::Object;
pub use value::Value;
