//! Plugins shipped with the framework.

pub mod base;
