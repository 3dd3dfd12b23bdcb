pub mod app;
pub mod flatten;
pub mod format;
pub mod input;
pub mod render;
pub mod theme;

pub use app::run;
