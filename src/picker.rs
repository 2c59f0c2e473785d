//! File picker popup state.
//!
//! Lists candidate documents from a directory. The extension filter is only a
//! convenience for the listing; any typed path is accepted and the backend
//! decides what it can ingest.

use std::fs;
use std::path::{Path, PathBuf};

use ratatui::widgets::ListState;
use tracing::warn;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

pub fn matches_filter(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Default)]
pub struct FilePicker {
    pub open: bool,
    pub dir: PathBuf,
    pub entries: Vec<PathBuf>,
    pub state: ListState,
    pub path_input: String,
    pub path_cursor: usize,
}

impl FilePicker {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            ..Self::default()
        }
    }

    pub fn show(&mut self) {
        self.refresh();
        self.open = true;
    }

    pub fn hide(&mut self) {
        self.open = false;
    }

    /// Clear the chosen path so the same file can be picked again.
    pub fn reset(&mut self) {
        self.path_input.clear();
        self.path_cursor = 0;
    }

    pub fn refresh(&mut self) {
        self.entries = match fs::read_dir(&self.dir) {
            Ok(read_dir) => {
                let mut entries: Vec<PathBuf> = read_dir
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file() && matches_filter(path))
                    .collect();
                entries.sort();
                entries
            }
            Err(e) => {
                warn!("Could not list {}: {}", self.dir.display(), e);
                Vec::new()
            }
        };

        self.state
            .select(if self.entries.is_empty() { None } else { Some(0) });
    }

    /// The file to upload: a typed path takes precedence over the list selection.
    pub fn selected_path(&self) -> Option<PathBuf> {
        let typed = self.path_input.trim();
        if !typed.is_empty() {
            let path = PathBuf::from(typed);
            return Some(if path.is_absolute() {
                path
            } else {
                self.dir.join(path)
            });
        }

        self.state
            .selected()
            .and_then(|i| self.entries.get(i))
            .cloned()
    }

    pub fn nav_down(&mut self) {
        let len = self.entries.len();
        if len > 0 {
            let i = self.state.selected().map(|i| (i + 1).min(len - 1)).unwrap_or(0);
            self.state.select(Some(i));
        }
    }

    pub fn nav_up(&mut self) {
        let i = self.state.selected().unwrap_or(0);
        self.state.select(Some(i.saturating_sub(1)));
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.path_input, self.path_cursor);
        self.path_input.insert(byte_pos, c);
        self.path_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.path_cursor > 0 {
            self.path_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.path_input, self.path_cursor);
            self.path_input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.path_cursor = self.path_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.path_input.chars().count();
        self.path_cursor = (self.path_cursor + 1).min(char_count);
    }
}
