//! UI / rendering layer — everything that touches Ratatui widgets.
//!
//! This layer reads [`AppState`](crate::app::state::AppState) and turns it
//! into cells on the terminal.  No file or process I/O happens here.

pub mod form_view;
pub mod layout;
pub mod log_view;
pub mod popup;
pub mod spinner;
pub mod theme;
