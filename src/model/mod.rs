pub mod config;
pub mod entity;
pub mod todo;
pub mod workspace;

pub use config::*;
pub use entity::*;
pub use todo::*;
pub use workspace::*;
