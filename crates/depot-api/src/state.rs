//! Application state shared by every handler.

use depot_core::Config;
use depot_storage::inspect::{self, ContentInspector};

pub struct AppState {
    pub config: Config,
    /// Content classifier used by the image pipeline. Process-wide, never rebuilt per request.
    pub inspector: &'static dyn ContentInspector,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            config,
            inspector: inspect::shared(),
        }
    }
}
