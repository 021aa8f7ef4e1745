//! Benchmark support utilities for CaskDB.

#![deny(unsafe_code)]

pub mod utils;
