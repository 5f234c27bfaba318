pub mod artifacts;
pub mod codec;

pub use artifacts::*;
pub use codec::*;
