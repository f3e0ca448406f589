//! Type definitions

pub mod bus;
pub mod route;
pub mod school;
pub mod stop;

pub use bus::*;
pub use route::*;
pub use school::*;
pub use stop::*;
