//! Turns backend results and upload outcomes into assistant message text.
//!
//! The exact strings here are part of the client's observable behavior, so
//! they are kept byte-for-byte stable.

use crate::api::QueryResult;
use crate::mode::Mode;

pub const NO_RESULTS: &str = "I couldn't find any relevant information in your documents.";

pub const QUERY_FAILED: &str = "Sorry, I encountered an error searching your documents.";

const SOURCES_HEADER: &str = "\n\n---\n**Sources:**\n";

const FOUND_HEADER: &str = "Here's what I found:\n\n";

/// Render a query result for display in the conversation.
///
/// Chat mode with a non-empty answer shows the answer plus a sources list.
/// Everything else falls back to listing the raw references.
pub fn format_response(result: &QueryResult, mode: Mode) -> String {
    let answer = result.answer.as_deref().filter(|a| !a.is_empty());

    if let (Mode::Chat, Some(answer)) = (mode, answer) {
        let mut content = answer.to_string();
        if !result.results.is_empty() {
            content.push_str(SOURCES_HEADER);
            for hit in &result.results {
                let name = hit
                    .filename
                    .as_deref()
                    .filter(|f| !f.is_empty())
                    .unwrap_or("Unknown");
                content.push_str(&format!(
                    "• {} (Confidence: {:.0}%)\n",
                    name,
                    (hit.score * 100.0).round()
                ));
            }
        }
        return content;
    }

    if result.results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut content = FOUND_HEADER.to_string();
    for (i, hit) in result.results.iter().enumerate() {
        content.push_str(&format!(
            "**Reference {} (Score: {}):**\n{}\n\n",
            i + 1,
            format_score(hit.score),
            hit.content
        ));
    }
    content
}

/// Score with three decimals, rounding exact halves away from zero.
///
/// `{:.3}` already rounds on the exact binary value, but it breaks exact ties
/// to even. A tie at the third decimal is always an odd multiple of 1/16.
fn format_score(score: f64) -> String {
    let sixteenths = score * 16.0;
    if sixteenths.fract() == 0.0 && sixteenths % 2.0 != 0.0 {
        format!("{:.3}", (score * 1000.0).round() / 1000.0)
    } else {
        format!("{:.3}", score)
    }
}

pub fn upload_succeeded(filename: &str) -> String {
    format!(
        "Success! I have indexed **{}**. You can now ask questions about it.",
        filename
    )
}

pub fn upload_failed(filename: &str) -> String {
    format!("Error uploading **{}**. Please try again.", filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SourceHit;

    fn hit(filename: Option<&str>, score: f64, content: &str) -> SourceHit {
        SourceHit {
            filename: filename.map(str::to_string),
            score,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_chat_answer_with_sources() {
        let result = QueryResult {
            answer: Some("Paris is the capital.".to_string()),
            results: vec![hit(Some("geo.txt"), 0.87, "France...")],
        };
        assert_eq!(
            format_response(&result, Mode::Chat),
            "Paris is the capital.\n\n---\n**Sources:**\n• geo.txt (Confidence: 87%)\n"
        );
    }

    #[test]
    fn test_chat_answer_without_sources() {
        let result = QueryResult {
            answer: Some("No idea.".to_string()),
            results: vec![],
        };
        assert_eq!(format_response(&result, Mode::Chat), "No idea.");
    }

    #[test]
    fn test_chat_sources_fall_back_to_unknown() {
        let result = QueryResult {
            answer: Some("A".to_string()),
            results: vec![hit(None, 0.5, ""), hit(Some(""), 0.125, "")],
        };
        assert_eq!(
            format_response(&result, Mode::Chat),
            "A\n\n---\n**Sources:**\n• Unknown (Confidence: 50%)\n• Unknown (Confidence: 13%)\n"
        );
    }

    #[test]
    fn test_search_with_no_results() {
        let result = QueryResult {
            answer: None,
            results: vec![],
        };
        assert_eq!(
            format_response(&result, Mode::Search),
            "I couldn't find any relevant information in your documents."
        );
    }

    #[test]
    fn test_search_lists_references() {
        let result = QueryResult {
            answer: None,
            results: vec![hit(None, 0.5, "foo")],
        };
        assert_eq!(
            format_response(&result, Mode::Search),
            "Here's what I found:\n\n**Reference 1 (Score: 0.500):**\nfoo\n\n"
        );
    }

    #[test]
    fn test_search_ignores_answer() {
        let result = QueryResult {
            answer: Some("ignored".to_string()),
            results: vec![hit(Some("a.md"), 0.91234, "one"), hit(Some("b.md"), 0.4, "two")],
        };
        assert_eq!(
            format_response(&result, Mode::Search),
            "Here's what I found:\n\n**Reference 1 (Score: 0.912):**\none\n\n**Reference 2 (Score: 0.400):**\ntwo\n\n"
        );
    }

    #[test]
    fn test_score_ties_round_up() {
        let result = QueryResult {
            answer: None,
            results: vec![hit(None, 0.0625, "x")],
        };
        assert_eq!(
            format_response(&result, Mode::Search),
            "Here's what I found:\n\n**Reference 1 (Score: 0.063):**\nx\n\n"
        );

        assert_eq!(format_score(0.1875), "0.188");
        assert_eq!(format_score(0.3125), "0.313");
        assert_eq!(format_score(0.125), "0.125");
        assert_eq!(format_score(1.0), "1.000");
        assert_eq!(format_score(0.91234), "0.912");
        assert_eq!(format_score(-0.0625), "-0.063");
    }

    #[test]
    fn test_chat_without_answer_falls_back_to_references() {
        let empty_answer = QueryResult {
            answer: Some(String::new()),
            results: vec![],
        };
        assert_eq!(format_response(&empty_answer, Mode::Chat), NO_RESULTS);

        let missing_answer = QueryResult {
            answer: None,
            results: vec![hit(None, 0.25, "bar")],
        };
        assert_eq!(
            format_response(&missing_answer, Mode::Chat),
            "Here's what I found:\n\n**Reference 1 (Score: 0.250):**\nbar\n\n"
        );
    }

    #[test]
    fn test_upload_messages_name_the_file() {
        let ok = upload_succeeded("notes.txt");
        assert!(ok.contains("Success") && ok.contains("notes.txt"));

        let err = upload_failed("notes.txt");
        assert_eq!(err, "Error uploading **notes.txt**. Please try again.");
    }
}
