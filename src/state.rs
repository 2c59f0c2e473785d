//! UI-agnostic conversation state
//!
//! The conversation only changes through the transitions on [`Conversation`].
//! The terminal UI and the one-shot commands both drive it, so nothing here
//! depends on a specific frontend.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::QueryResult;
use crate::format;
use crate::mode::Mode;

pub const GREETING: &str =
    "Hello! I am your Endee document assistant. Upload a PDF or text file to get started.";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    uploaded_files: Vec<String>,
    mode: Mode,
    processing: bool,
    uploading: bool,
}

impl Conversation {
    pub fn new(mode: Mode) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            uploaded_files: Vec::new(),
            mode,
            processing: false,
            uploading: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn uploaded_files(&self) -> &[String] {
        &self.uploaded_files
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Record a user question and mark a query as in flight.
    ///
    /// Returns the trimmed query text to send, or `None` when the input is
    /// blank, in which case nothing changes.
    pub fn submit_query(&mut self, input: &str) -> Option<String> {
        let query = input.trim();
        if query.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::user(query));
        self.processing = true;
        Some(query.to_string())
    }

    /// Apply the outcome of a query issued in `mode`.
    pub fn finish_query(&mut self, mode: Mode, outcome: anyhow::Result<QueryResult>) {
        let content = match outcome {
            Ok(result) => format::format_response(&result, mode),
            Err(e) => {
                error!("Query failed: {:#}", e);
                format::QUERY_FAILED.to_string()
            }
        };
        self.messages.push(ChatMessage::assistant(content));
        self.processing = false;
    }

    pub fn begin_upload(&mut self) {
        self.uploading = true;
    }

    /// Apply the outcome of uploading `filename`.
    pub fn finish_upload(&mut self, filename: &str, outcome: anyhow::Result<()>) {
        match outcome {
            Ok(()) => {
                info!(filename, "Document indexed");
                self.uploaded_files.push(filename.to_string());
                self.messages
                    .push(ChatMessage::assistant(format::upload_succeeded(filename)));
            }
            Err(e) => {
                error!("Upload of {} failed: {:#}", filename, e);
                self.messages
                    .push(ChatMessage::assistant(format::upload_failed(filename)));
            }
        }
        self.uploading = false;
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SourceHit;
    use anyhow::anyhow;

    fn found(score: f64, content: &str) -> QueryResult {
        QueryResult {
            answer: None,
            results: vec![SourceHit {
                filename: None,
                score,
                content: content.to_string(),
            }],
        }
    }

    #[test]
    fn test_new_conversation_starts_with_greeting() {
        let convo = Conversation::default();
        assert_eq!(convo.messages(), &[ChatMessage::assistant(GREETING)]);
        assert_eq!(convo.mode(), Mode::Chat);
        assert!(!convo.is_processing());
        assert!(!convo.is_uploading());
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut convo = Conversation::default();
        for input in ["", "   ", "\n\t "] {
            assert_eq!(convo.submit_query(input), None);
        }
        assert_eq!(convo.messages().len(), 1);
        assert!(!convo.is_processing());
    }

    #[test]
    fn test_submit_appends_trimmed_user_message() {
        let mut convo = Conversation::default();
        let query = convo.submit_query("  what is endee?  ");
        assert_eq!(query.as_deref(), Some("what is endee?"));
        assert_eq!(convo.messages().last(), Some(&ChatMessage::user("what is endee?")));
        assert!(convo.is_processing());
    }

    #[test]
    fn test_successful_query_appends_one_assistant_message() {
        let mut convo = Conversation::new(Mode::Search);
        convo.submit_query("foo?");
        convo.finish_query(Mode::Search, Ok(found(0.5, "foo")));

        assert_eq!(convo.messages().len(), 3);
        assert_eq!(
            convo.messages()[2],
            ChatMessage::assistant("Here's what I found:\n\n**Reference 1 (Score: 0.500):**\nfoo\n\n")
        );
        assert!(!convo.is_processing());
    }

    #[test]
    fn test_failed_query_appends_apology() {
        let mut convo = Conversation::default();
        convo.submit_query("anything");
        convo.finish_query(Mode::Chat, Err(anyhow!("connection refused")));

        assert_eq!(convo.messages().len(), 3);
        assert_eq!(convo.messages()[2], ChatMessage::assistant(format::QUERY_FAILED));
        assert!(!convo.is_processing());
    }

    #[test]
    fn test_query_is_formatted_with_request_mode() {
        let mut convo = Conversation::new(Mode::Chat);
        convo.submit_query("q");
        convo.toggle_mode();
        let result = QueryResult {
            answer: Some("answer".to_string()),
            results: vec![],
        };
        convo.finish_query(Mode::Chat, Ok(result));
        assert_eq!(convo.messages()[2].content, "answer");
        assert_eq!(convo.mode(), Mode::Search);
    }

    #[test]
    fn test_successful_upload_records_file() {
        let mut convo = Conversation::default();
        convo.begin_upload();
        assert!(convo.is_uploading());

        convo.finish_upload("notes.txt", Ok(()));

        assert_eq!(convo.uploaded_files(), &["notes.txt".to_string()]);
        let last = &convo.messages().last().unwrap().content;
        assert!(last.contains("Success"));
        assert!(last.contains("notes.txt"));
        assert!(!convo.is_uploading());
    }

    #[test]
    fn test_failed_upload_does_not_record_file() {
        let mut convo = Conversation::default();
        convo.begin_upload();
        convo.finish_upload("notes.txt", Err(anyhow!("500 Internal Server Error")));

        assert!(convo.uploaded_files().is_empty());
        let last = convo.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert!(last.content.contains("Error"));
        assert!(last.content.contains("notes.txt"));
        assert!(!convo.is_uploading());
    }

    #[test]
    fn test_uploaded_files_keep_duplicates_in_order() {
        let mut convo = Conversation::default();
        for name in ["a.md", "b.pdf", "a.md"] {
            convo.begin_upload();
            convo.finish_upload(name, Ok(()));
        }
        assert_eq!(convo.uploaded_files(), &["a.md", "b.pdf", "a.md"]);
    }

    #[test]
    fn test_busy_flags_are_independent() {
        let mut convo = Conversation::default();
        convo.submit_query("q");
        convo.begin_upload();
        assert!(convo.is_processing() && convo.is_uploading());

        convo.finish_upload("a.md", Ok(()));
        assert!(convo.is_processing());
        assert!(!convo.is_uploading());
    }

    #[test]
    fn test_completions_apply_in_arrival_order() {
        let mut convo = Conversation::new(Mode::Search);
        convo.submit_query("first");
        convo.submit_query("second");
        convo.finish_query(Mode::Search, Ok(found(0.2, "for second")));
        convo.finish_query(Mode::Search, Ok(found(0.1, "for first")));

        let contents: Vec<&str> = convo.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents[1], "first");
        assert_eq!(contents[2], "second");
        assert!(contents[3].contains("for second"));
        assert!(contents[4].contains("for first"));
    }
}
