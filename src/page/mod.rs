//! Page lifecycle: loading, stale-response handling and reactive recompute

pub mod controller;
pub mod state;

pub use controller::PageController;
pub use state::{LoadSettings, PageState, PageStatus, TimeoutPolicy};
