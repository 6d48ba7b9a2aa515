// ABOUTME: Library root for sessionchat — re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod api;
pub mod app;
pub mod channel;
pub mod config;
pub mod logging;
pub mod store;
pub mod tui;
