use serde::{Deserialize, Serialize};

/// Foreground state reported by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

/// Turns a stream of app-state changes into revalidation triggers.
#[derive(Debug, Clone)]
pub struct FocusMonitor {
    current: AppState,
}

impl Default for FocusMonitor {
    fn default() -> Self {
        Self::new(AppState::Active)
    }
}

impl FocusMonitor {
    pub fn new(initial: AppState) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> AppState {
        self.current
    }

    /// Record `next`; true only when resuming from inactive or background.
    pub fn transition(&mut self, next: AppState) -> bool {
        let resumed = matches!(self.current, AppState::Inactive | AppState::Background)
            && next == AppState::Active;
        self.current = next;
        resumed
    }
}
