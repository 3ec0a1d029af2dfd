//! Field access: caller identity, the visibility gate, and the operations
//! synthesized for each declared field.

mod caller;
pub mod gate;
pub mod generator;

pub use caller::Caller;
pub use gate::FieldGuard;
pub use generator::{accessor_name, mutator_name, Invocation, MethodTable, Operation};
