pub mod decrypt;
pub mod encrypt;
pub mod info;
pub mod verify;

pub use decrypt::*;
pub use encrypt::*;
pub use info::*;
pub use verify::*;
