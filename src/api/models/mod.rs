pub mod sweets;
pub mod system;

pub use sweets::*;
pub use system::*;
