pub mod preprocessing;
pub mod masking;
pub mod edges;
pub mod telea;
pub mod navier_stokes;
pub mod blend;

mod canvas;
mod marching;

pub use preprocessing::*;
pub use masking::*;
pub use edges::*;
pub use telea::*;
pub use navier_stokes::*;
pub use blend::*;
