use std::sync::{Arc, Mutex};

use shared::{
    domain::{Theme, THEME_STORAGE_KEY},
    protocol::ClassificationRequest,
};
use tracing::{debug, info, warn};

pub mod api;
pub mod celebration;
pub mod dom;
pub mod preferences;

pub use api::{ApiCallError, ClassificationApi, HttpClassificationApi};
pub use celebration::{Celebration, CelebrationOptions, NoCelebration};
pub use dom::{Dom, ElementId, HeadlessDom, SelectedFile, THEME_ATTRIBUTE};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};

pub const NO_FILE_MESSAGE: &str = "Please select a CSV file containing tickets.";

/// How a user action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Input validation stopped the action before any request.
    Skipped,
    Completed,
    /// The request failed; holds the alerted message.
    Failed(String),
}

/// Page behavior: single and bulk classification plus the theme toggle.
///
/// Handlers do not guard against overlapping activations; a second
/// classification started while one is pending runs alongside it and the
/// first to finish hides the loader.
pub struct UiController {
    api: Arc<dyn ClassificationApi>,
    dom: Arc<dyn Dom>,
    preferences: Arc<dyn PreferenceStore>,
    celebration: Arc<dyn Celebration>,
    theme: Mutex<Theme>,
}

impl UiController {
    pub fn new(
        api: Arc<dyn ClassificationApi>,
        dom: Arc<dyn Dom>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            api,
            dom,
            preferences,
            celebration: Arc::new(NoCelebration),
            theme: Mutex::new(Theme::default()),
        }
    }

    pub fn with_celebration(mut self, celebration: Arc<dyn Celebration>) -> Self {
        self.celebration = celebration;
        self
    }

    /// Applies the stored theme to the page. Call once before the first render.
    pub fn init(&self) -> Theme {
        let stored = self.preferences.get(THEME_STORAGE_KEY);
        let theme = Theme::from_stored(stored.as_deref());
        self.apply_theme(theme);
        info!(%theme, "applied stored theme");
        theme
    }

    pub fn theme(&self) -> Theme {
        *self.lock_theme()
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut current = self.lock_theme();
            *current = current.toggled();
            *current
        };
        self.dom.set_root_attribute(THEME_ATTRIBUTE, theme.as_str());
        if let Err(error) = self.preferences.set(THEME_STORAGE_KEY, theme.as_str()) {
            warn!(%theme, %error, "failed to persist theme preference");
        }
        self.dom.set_text(ElementId::ThemeToggle, theme.toggle_icon());
        debug!(%theme, "toggled theme");
        theme
    }

    pub async fn classify_ticket(&self) -> ActionOutcome {
        let text = self.dom.value(ElementId::TicketText).trim().to_string();
        if text.is_empty() {
            debug!("ignoring classify with empty ticket text");
            return ActionOutcome::Skipped;
        }

        self.dom.set_hidden(ElementId::Result, true);
        self.show_loader();
        let outcome = match self.api.classify(&ClassificationRequest { text }).await {
            Ok(result) => {
                self.dom.set_text(ElementId::Category, &result.category);
                self.dom.set_text(ElementId::Team, &result.assigned_team);
                self.dom.set_hidden(ElementId::Result, false);
                info!(category = %result.category, team = %result.assigned_team, "ticket classified");
                self.celebrate();
                ActionOutcome::Completed
            }
            Err(err) => self.fail(err),
        };
        self.hide_loader();
        outcome
    }

    pub async fn classify_file(&self) -> ActionOutcome {
        let Some(file) = self
            .dom
            .selected_files(ElementId::FileInput)
            .into_iter()
            .next()
        else {
            self.dom.alert(NO_FILE_MESSAGE);
            return ActionOutcome::Skipped;
        };

        self.dom.set_hidden(ElementId::FileResult, true);
        self.show_loader();
        let rendered = match self.api.classify_file(&file).await {
            Ok(data) => serde_json::to_string_pretty(&data).map_err(ApiCallError::from),
            Err(err) => Err(err),
        };
        let outcome = match rendered {
            Ok(pretty) => {
                self.dom.set_text(ElementId::FileResult, &pretty);
                self.dom.set_hidden(ElementId::FileResult, false);
                info!(file = %file.name, "ticket file classified");
                self.celebrate();
                ActionOutcome::Completed
            }
            Err(err) => self.fail(err),
        };
        self.hide_loader();
        outcome
    }

    fn apply_theme(&self, theme: Theme) {
        *self.lock_theme() = theme;
        self.dom.set_root_attribute(THEME_ATTRIBUTE, theme.as_str());
        self.dom.set_text(ElementId::ThemeToggle, theme.toggle_icon());
    }

    fn lock_theme(&self) -> std::sync::MutexGuard<'_, Theme> {
        self.theme.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn show_loader(&self) {
        self.dom.set_hidden(ElementId::Loader, false);
    }

    fn hide_loader(&self) {
        self.dom.set_hidden(ElementId::Loader, true);
    }

    fn celebrate(&self) {
        self.celebration.celebrate(&CelebrationOptions::default());
    }

    fn fail(&self, err: ApiCallError) -> ActionOutcome {
        let message = format!("Error: {err}");
        warn!(error = %err, "classification request failed");
        self.dom.alert(&message);
        ActionOutcome::Failed(message)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
