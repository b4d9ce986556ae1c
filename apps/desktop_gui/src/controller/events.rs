//! UI/backend events for the desktop GUI controller.

use client_core::UiStatus;

pub enum UiEvent {
    /// Transient worker lifecycle notes shown in the status bar.
    Info(String),
    /// Worker could not start at all; the session is unusable.
    FatalStartup(String),
    CatalogLoaded { soil_types: Vec<String> },
    StatusChanged(UiStatus),
}

/// One-line summary for the status bar, derived from the current session
/// status and catalog availability.
pub fn status_line(status: &UiStatus, catalog_empty: bool) -> String {
    match status {
        UiStatus::Loading => "Getting recommendations...".to_string(),
        UiStatus::Success(_) => "Recommendation ready".to_string(),
        UiStatus::Error(_) => "Something went wrong; see the message above".to_string(),
        UiStatus::Idle if catalog_empty => "Waiting for soil types from the backend".to_string(),
        UiStatus::Idle => "Fill in the soil readings and submit".to_string(),
    }
}
