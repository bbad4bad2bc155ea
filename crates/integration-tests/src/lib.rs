//! Intentionally empty. This crate exists to run the API test suites in
//! `tests/` against a fully wired in-memory server.
