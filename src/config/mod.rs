pub mod specification;

pub use specification::*;
