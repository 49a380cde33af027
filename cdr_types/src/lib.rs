//! CDR Type Model
//!
//! This crate contains the type model shared by the code generator and the
//! reference codec: the closed set of type variants, struct and union
//! members with their declarators, and the arena that owns every type of a
//! compilation unit. All invariants are checked when a member, declarator or
//! label is inserted, so a model that reaches generation is well formed.

pub mod arena;
pub mod error;
pub mod layout;
pub mod structs;
pub mod types;
pub mod unions;

// Re-export commonly used types at the crate root
pub use arena::*;
pub use error::*;
pub use layout::*;
pub use structs::*;
pub use types::*;
pub use unions::*;
