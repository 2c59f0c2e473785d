use std::path::PathBuf;
use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::api::{self, Backend, QueryResult, ServiceStatus};
use crate::mode::Mode;
use crate::picker::FilePicker;
use crate::state::{ChatRole, Conversation};
use crate::tui::AppEvent;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Documents,
    Input,
}

/// Result of a backend request, delivered back to the UI task.
#[derive(Debug)]
pub enum Completion {
    Query {
        mode: Mode,
        outcome: anyhow::Result<QueryResult>,
    },
    Upload {
        filename: String,
        outcome: anyhow::Result<()>,
    },
    Status(anyhow::Result<ServiceStatus>),
}

/// Backend reachability as last observed by the status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendHealth {
    Unknown,
    Online(String),
    Offline,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub conversation: Conversation,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Sidebar
    pub documents_state: ListState,
    pub picker: FilePicker,
    pub health: BackendHealth,
    pub api_url: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub documents_area: Option<Rect>,

    backend: Arc<dyn Backend>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        backend: Arc<dyn Backend>,
        api_url: String,
        mode: Mode,
        picker_dir: PathBuf,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,
            conversation: Conversation::new(mode),

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            documents_state: ListState::default(),
            picker: FilePicker::new(picker_dir),
            health: BackendHealth::Unknown,
            api_url,

            animation_frame: 0,

            chat_area: None,
            documents_area: None,

            backend,
            events,
        }
    }

    /// Send the input box contents as a query.
    ///
    /// Ignored while a query is already in flight or when the input is blank.
    /// Returns whether a request was started.
    pub fn send_message(&mut self) -> bool {
        if self.conversation.is_processing() {
            return false;
        }

        let Some(query) = self.conversation.submit_query(&self.input) else {
            return false;
        };

        self.input.clear();
        self.cursor = 0;
        self.scroll_chat_to_bottom();

        let mode = self.conversation.mode();
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = backend.query(&query, mode).await;
            let _ = events.send(AppEvent::Completed(Completion::Query { mode, outcome }));
        });

        true
    }

    pub fn open_picker(&mut self) {
        if !self.conversation.is_uploading() {
            self.picker.show();
        }
    }

    /// Upload the file chosen in the picker.
    ///
    /// Ignored while another upload is in flight or when nothing is chosen.
    /// Returns whether a request was started.
    pub fn start_upload(&mut self) -> bool {
        if self.conversation.is_uploading() {
            return false;
        }

        let Some(path) = self.picker.selected_path() else {
            return false;
        };

        self.picker.hide();
        self.conversation.begin_upload();

        let filename = api::file_name(&path);
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = backend.ingest_path(&path).await;
            let _ = events.send(AppEvent::Completed(Completion::Upload { filename, outcome }));
        });

        true
    }

    pub fn check_backend(&self) {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = backend.status().await;
            let _ = events.send(AppEvent::Completed(Completion::Status(outcome)));
        });
    }

    /// Apply a finished backend request to the conversation.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Query { mode, outcome } => {
                self.conversation.finish_query(mode, outcome);
                self.scroll_chat_to_bottom();
            }
            Completion::Upload { filename, outcome } => {
                self.conversation.finish_upload(&filename, outcome);
                self.picker.reset();
                self.scroll_chat_to_bottom();
            }
            Completion::Status(Ok(status)) => {
                info!(service = %status.service, status = %status.status, "Backend reachable");
                self.health = BackendHealth::Online(status.status);
            }
            Completion::Status(Err(e)) => {
                warn!("Backend at {} unreachable: {:#}", self.api_url, e);
                self.health = BackendHealth::Offline;
            }
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.conversation.set_mode(mode);
    }

    pub fn toggle_mode(&mut self) {
        self.conversation.toggle_mode();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_processing() || self.conversation.is_uploading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Total rendered height of the chat at the current width.
    pub fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let rows = ui::chat_lines(self, wrap_width).len();
        u16::try_from(rows).unwrap_or(u16::MAX)
    }

    /// Scroll chat to the newest message
    pub fn scroll_chat_to_bottom(&mut self) {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = self.chat_line_count().saturating_sub(visible_height);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let visible_height = self.chat_height.max(1);
        let max_scroll = self.chat_line_count().saturating_sub(visible_height);
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn documents_nav_down(&mut self) {
        let len = self.conversation.uploaded_files().len();
        if len > 0 {
            let i = self
                .documents_state
                .selected()
                .map(|i| (i + 1).min(len - 1))
                .unwrap_or(0);
            self.documents_state.select(Some(i));
        }
    }

    pub fn documents_nav_up(&mut self) {
        if !self.conversation.uploaded_files().is_empty() {
            let i = self.documents_state.selected().unwrap_or(0);
            self.documents_state.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn user_message_count(&self) -> usize {
        self.conversation
            .messages()
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .count()
    }
}
