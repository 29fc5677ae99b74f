//! Contract data model: identifiers, parameters, and request/result shapes.

pub mod binding;
pub mod id;
pub mod instance;
pub mod operation;
pub mod params;

pub use binding::*;
pub use id::*;
pub use instance::*;
pub use operation::*;
pub use params::*;
