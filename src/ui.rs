use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use crate::app::{App, BackendHealth, FocusPane, InputMode};
use crate::mode::Mode;
use crate::picker::ACCEPTED_EXTENSIONS;
use crate::state::ChatRole;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    // Horizontal rule separating an answer from its sources
    if text.trim() == "---" {
        return Line::from(Span::styled(
            "─".repeat(24),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(len) = after_open.find("**") else {
            break;
        };

        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }

        let bold = &after_open[..len];
        if bold.is_empty() {
            spans.push(Span::raw("****"));
        } else {
            spans.push(Span::styled(
                bold.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        rest = &after_open[len + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

/// Wrap a styled line to `width` columns on word boundaries.
/// Words longer than a row are split. Runs of whitespace collapse to one space.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line];
    }

    let mut words: Vec<Vec<(char, Style)>> = Vec::new();
    let mut word = Vec::new();
    for span in &line.spans {
        for c in span.content.chars() {
            if c.is_whitespace() {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                word.push((c, span.style));
            }
        }
    }
    if !word.is_empty() {
        words.push(word);
    }

    let mut rows: Vec<Vec<(char, Style)>> = Vec::new();
    let mut row: Vec<(char, Style)> = Vec::new();
    for word in &words {
        for chunk in word.chunks(width) {
            if row.is_empty() {
                row.extend_from_slice(chunk);
            } else if row.len() + 1 + chunk.len() <= width {
                // Keep the space inside a bold run bold
                let prev = row.last().map(|(_, style)| *style);
                let next = chunk.first().map(|(_, style)| *style);
                let space_style = if prev == next {
                    prev.unwrap_or_default()
                } else {
                    Style::default()
                };
                row.push((' ', space_style));
                row.extend_from_slice(chunk);
            } else {
                rows.push(std::mem::take(&mut row));
                row.extend_from_slice(chunk);
            }
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }

    if rows.is_empty() {
        return vec![Line::default()];
    }

    rows.into_iter().map(styled_row).collect()
}

fn styled_row(row: Vec<(char, Style)>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    for (c, style) in row {
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(c);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    Line::from(spans)
}

/// The chat transcript wrapped to `width`, one entry per screen row.
///
/// Rendering and scroll calculations share this so the scroll offset always
/// matches what is drawn.
pub fn chat_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.extend(wrap_line(Line::from(line.to_string()), width));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Endee:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.extend(wrap_line(parse_markdown_line(line), width));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.conversation.is_processing() {
        lines.push(Line::from(Span::styled(
            "Endee:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(32),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_sidebar(app, frame, sidebar_area);
    render_chat(app, frame, main_area);
    render_footer(app, frame, footer_area);

    if app.picker.open {
        render_file_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (health_text, health_color) = match &app.health {
        BackendHealth::Unknown => ("connecting".to_string(), Color::DarkGray),
        BackendHealth::Online(status) => (status.clone(), Color::Green),
        BackendHealth::Offline => ("offline".to_string(), Color::Red),
    };

    let title = Line::from(vec![
        Span::styled(" Endee RAG ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("{} ", app.api_url), Style::default().fg(Color::Gray)),
        Span::styled(format!("[{}]", health_text), Style::default().fg(health_color)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let [mode_area, upload_area, documents_area, credit_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    // Mode toggle
    let current = app.conversation.mode();
    let mut mode_spans = Vec::new();
    for (i, mode) in Mode::all().into_iter().enumerate() {
        if i > 0 {
            mode_spans.push(Span::raw(" "));
        }
        let style = if mode == current {
            Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        mode_spans.push(Span::styled(format!(" {} ", mode.display_name()), style));
    }
    let mode_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Mode (m) ");
    frame.render_widget(Paragraph::new(Line::from(mode_spans)).block(mode_block), mode_area);

    // Upload control
    let uploading = app.conversation.is_uploading();
    let upload_text = if uploading {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Span::styled(
            format!(" Uploading{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(" Upload Document (u)", Style::default().fg(Color::White))
    };
    let upload_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if uploading { Color::DarkGray } else { Color::Blue }));
    frame.render_widget(Paragraph::new(upload_text).block(upload_block), upload_area);

    // Indexed documents
    app.documents_area = Some(documents_area);
    let documents_focused = app.focus == FocusPane::Documents;
    let documents_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if documents_focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Indexed Documents ");

    if app.conversation.uploaded_files().is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No documents yet",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
        .block(documents_block);
        frame.render_widget(empty, documents_area);
    } else {
        let items: Vec<ListItem> = app
            .conversation
            .uploaded_files()
            .iter()
            .map(|name| ListItem::new(format!(" {} ", name)))
            .collect();
        let list = List::new(items)
            .block(documents_block)
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, documents_area, &mut app.documents_state);
    }

    let credit = Paragraph::new(Span::styled(
        " Powered by Endee Vector DB",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(credit, credit_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store area for mouse hit-testing
    app.chat_area = Some(chat_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_focused = app.focus == FocusPane::Chat;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if chat_focused { Color::Cyan } else { Color::DarkGray }))
        .title(format!(" {} ", app.conversation.mode().display_name()));

    let lines = chat_lines(app, app.chat_width as usize);
    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, input_area: Rect) {
    let processing = app.conversation.is_processing();
    let input_border_color = if processing {
        Color::DarkGray
    } else if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if processing {
        " Waiting for answer... "
    } else {
        " Ask something about your documents "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(if processing { Color::DarkGray } else { Color::Cyan }))
        .block(input_block);

    frame.render_widget(input, input_area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing && !app.picker.open {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = if app.picker.open {
        " UPLOAD "
    } else {
        match app.input_mode {
            InputMode::Normal => " NORMAL ",
            InputMode::Editing => " INSERT ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let hints: Vec<Span> = if app.picker.open {
        [
            hint("↑/↓", "select"),
            hint("type", "path"),
            hint("Enter", "upload"),
            hint("Esc", "cancel"),
        ]
        .into_iter()
        .flatten()
        .collect()
    } else {
        match app.input_mode {
            InputMode::Editing => [hint("Enter", "send"), hint("Esc", "stop typing")]
                .into_iter()
                .flatten()
                .collect(),
            InputMode::Normal => [
                hint("i", "ask"),
                hint("u", "upload"),
                hint("m", "mode"),
                hint("j/k", "scroll"),
                hint("Tab", "focus"),
                hint("q", "quit"),
            ]
            .into_iter()
            .flatten()
            .collect(),
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_file_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = (app.picker.entries.len() as u16 + 5)
        .max(8)
        .min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let filter = ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Upload Document ({}) ", filter));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [path_area, list_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(inner);

    let path_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Path (or pick below) ");
    let path_inner_width = path_area.width.saturating_sub(2) as usize;
    let cursor = app.picker.path_cursor;
    let scroll_offset = if path_inner_width > 0 && cursor >= path_inner_width {
        cursor - path_inner_width + 1
    } else {
        0
    };
    let visible_path: String = app
        .picker
        .path_input
        .chars()
        .skip(scroll_offset)
        .take(path_inner_width)
        .collect();
    frame.render_widget(Paragraph::new(visible_path).block(path_block), path_area);
    frame.set_cursor_position((
        path_area.x + (cursor - scroll_offset) as u16 + 1,
        path_area.y + 1,
    ));

    if app.picker.entries.is_empty() {
        let empty = Paragraph::new(Span::styled(
            format!(" No matching files in {}", app.picker.dir.display()),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, list_area);
        return;
    }

    let items: Vec<ListItem> = app
        .picker
        .entries
        .iter()
        .map(|path| ListItem::new(format!(" {} ", crate::api::file_name(path))))
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.picker.state);
}
