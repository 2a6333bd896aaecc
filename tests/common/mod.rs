#![allow(dead_code)]

pub mod builders;
pub mod mock_store;

pub use builders::*;
pub use mock_store::*;
