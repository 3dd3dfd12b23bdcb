pub mod model;
pub mod ops;
pub mod store;
pub mod tui;
