//! Argument types shared between the binary and its integration tests.

pub mod cli_args;
