//! Shared harness for retain end-to-end tests

pub mod harness;
