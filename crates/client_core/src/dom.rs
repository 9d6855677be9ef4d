//! Page elements the controller reads and mutates.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Mutex, MutexGuard},
};

/// Document-root attribute carrying the active theme.
pub const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Loader,
    TicketText,
    FileInput,
    Result,
    Category,
    Team,
    FileResult,
    ThemeToggle,
}

impl ElementId {
    pub const ALL: [ElementId; 8] = [
        Self::Loader,
        Self::TicketText,
        Self::FileInput,
        Self::Result,
        Self::Category,
        Self::Team,
        Self::FileResult,
        Self::ThemeToggle,
    ];

    /// Markup id of the element.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loader => "loader",
            Self::TicketText => "ticketText",
            Self::FileInput => "fileInput",
            Self::Result => "result",
            Self::Category => "category",
            Self::Team => "team",
            Self::FileResult => "fileResult",
            Self::ThemeToggle => "themeToggle",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

pub trait Dom: Send + Sync {
    /// Current value of an input element; empty when unset.
    fn value(&self, id: ElementId) -> String;
    fn selected_files(&self, id: ElementId) -> Vec<SelectedFile>;
    fn set_text(&self, id: ElementId, text: &str);
    fn set_hidden(&self, id: ElementId, hidden: bool);
    fn set_root_attribute(&self, name: &str, value: &str);
    fn root_attribute(&self, name: &str) -> Option<String>;
    /// Blocking notice shown to the user.
    fn alert(&self, message: &str);
}

#[derive(Debug, Default)]
struct PageState {
    values: HashMap<ElementId, String>,
    files: HashMap<ElementId, Vec<SelectedFile>>,
    texts: HashMap<ElementId, String>,
    hidden: HashSet<ElementId>,
    root_attributes: HashMap<String, String>,
    alerts: Vec<String>,
}

/// In-memory page. Panels and the loader start hidden, as in the served markup.
#[derive(Debug)]
pub struct HeadlessDom {
    state: Mutex<PageState>,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDom {
    pub fn new() -> Self {
        let state = PageState {
            hidden: HashSet::from([ElementId::Loader, ElementId::Result, ElementId::FileResult]),
            ..PageState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_value(&self, id: ElementId, value: impl Into<String>) {
        self.lock().values.insert(id, value.into());
    }

    pub fn select_files(&self, id: ElementId, files: Vec<SelectedFile>) {
        self.lock().files.insert(id, files);
    }

    pub fn text(&self, id: ElementId) -> Option<String> {
        self.lock().texts.get(&id).cloned()
    }

    pub fn is_hidden(&self, id: ElementId) -> bool {
        self.lock().hidden.contains(&id)
    }

    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.clone()
    }

    /// Removes and returns the alerts shown so far.
    pub fn take_alerts(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().alerts)
    }
}

impl Dom for HeadlessDom {
    fn value(&self, id: ElementId) -> String {
        self.lock().values.get(&id).cloned().unwrap_or_default()
    }

    fn selected_files(&self, id: ElementId) -> Vec<SelectedFile> {
        self.lock().files.get(&id).cloned().unwrap_or_default()
    }

    fn set_text(&self, id: ElementId, text: &str) {
        self.lock().texts.insert(id, text.to_string());
    }

    fn set_hidden(&self, id: ElementId, hidden: bool) {
        let mut state = self.lock();
        if hidden {
            state.hidden.insert(id);
        } else {
            state.hidden.remove(&id);
        }
    }

    fn set_root_attribute(&self, name: &str, value: &str) {
        self.lock()
            .root_attributes
            .insert(name.to_string(), value.to_string());
    }

    fn root_attribute(&self, name: &str) -> Option<String> {
        self.lock().root_attributes.get(name).cloned()
    }

    fn alert(&self, message: &str) {
        self.lock().alerts.push(message.to_string());
    }
}
