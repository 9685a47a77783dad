pub mod call;
pub mod callable;
pub mod context;
pub mod error;
pub mod executor;
pub mod global;
pub mod output;
