pub mod order_ops;
pub mod transfer;

pub use order_ops::*;
pub use transfer::*;
