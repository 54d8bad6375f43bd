pub mod core;
pub mod services;
