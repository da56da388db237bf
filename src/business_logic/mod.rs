pub mod config;
pub mod patterns;
pub mod signals;
pub mod structure;
pub mod swing;
