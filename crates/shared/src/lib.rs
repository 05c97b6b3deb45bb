pub mod domain;
pub mod error;
pub mod mapping;
pub mod protocol;
pub mod timestamp;
