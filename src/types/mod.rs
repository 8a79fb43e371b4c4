pub mod trading;
pub mod order;
pub mod trade;

pub use trading::*;
pub use order::*;
pub use trade::*;
