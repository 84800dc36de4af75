//! Shared support for the HTTP-level test suites.

pub mod mocks;
