pub mod config;
pub mod io;
pub mod story;
pub mod style;
