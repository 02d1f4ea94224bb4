//! Application orchestration — state management, event loop, and input handling.

pub mod event;
pub mod form;
pub mod handler;
pub mod jobs;
pub mod state;
