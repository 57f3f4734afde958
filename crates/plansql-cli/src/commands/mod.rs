//! Command implementations

pub mod catalog;
pub mod check;
pub(crate) mod common;
pub mod compile;
pub mod explain;
