//! Bank statements: import and manual matching

pub mod import;

pub use import::*;
