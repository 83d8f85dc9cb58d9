pub mod boundary;
pub mod builder;
pub mod error;
