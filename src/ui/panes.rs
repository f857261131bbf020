//! Stateless render functions for the editor, preview and status panes.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::editor::EditorBuffer;
use super::theme::DEFAULT_THEME;
use crate::pipeline::RenderResult;
use crate::preview::{render_text, render_tree};

/// How the preview pane lays out a successful view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewMode {
    Text,
    Tree,
}

impl PreviewMode {
    pub fn toggle(self) -> Self {
        match self {
            PreviewMode::Text => PreviewMode::Tree,
            PreviewMode::Tree => PreviewMode::Text,
        }
    }

    fn title(self) -> &'static str {
        match self {
            PreviewMode::Text => " Preview ",
            PreviewMode::Tree => " Preview (tree) ",
        }
    }
}

fn bordered(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            DEFAULT_THEME.border_focused
        } else {
            DEFAULT_THEME.border_normal
        }))
}

pub fn render_editor_pane(frame: &mut Frame, area: Rect, editor: &mut EditorBuffer) {
    let height = area.height.saturating_sub(2) as usize;
    editor.follow_cursor(height);
    let (row, col) = editor.cursor();
    let gutter = editor.lines().len().to_string().len();

    let lines: Vec<Line> = editor
        .lines()
        .iter()
        .enumerate()
        .skip(editor.scroll)
        .take(height)
        .map(|(i, text)| {
            let number = Span::styled(
                format!("{:>width$} ", i + 1, width = gutter),
                Style::default().fg(DEFAULT_THEME.comment),
            );
            let line_style = if i == row {
                Style::default()
                    .fg(DEFAULT_THEME.fg)
                    .bg(DEFAULT_THEME.current_line_bg)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            Line::from(vec![number, Span::styled(text.clone(), line_style)])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).block(bordered(" component.tsx ", true)),
        area,
    );

    let x = area.x + 1 + gutter as u16 + 1 + col as u16;
    let y = area.y + 1 + row.saturating_sub(editor.scroll) as u16;
    if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
        frame.set_cursor_position((x, y));
    }
}

pub fn render_preview_pane(
    frame: &mut Frame,
    area: Rect,
    result: &RenderResult,
    mode: PreviewMode,
    scroll: u16,
) {
    let paragraph = match result {
        RenderResult::Success(view) => {
            let body = match mode {
                PreviewMode::Text => render_text(view),
                PreviewMode::Tree => render_tree(view),
            };
            Paragraph::new(body).style(Style::default().fg(DEFAULT_THEME.fg))
        }
        RenderResult::Failure(message) => Paragraph::new(message.as_str()).style(
            Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::BOLD),
        ),
    };
    frame.render_widget(
        paragraph
            .block(bordered(mode.title(), false))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}

pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    message: &str,
    result: &RenderResult,
    revision: u64,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let (label, color) = if result.is_success() {
        (" OK ", DEFAULT_THEME.success)
    } else {
        (" ERROR ", DEFAULT_THEME.error)
    };
    let left = Line::from(vec![
        Span::styled(
            label,
            Style::default()
                .bg(color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" rev {} ", revision),
            Style::default().fg(DEFAULT_THEME.primary),
        ),
        Span::styled(format!(" {} ", message), Style::default().fg(DEFAULT_THEME.fg)),
    ]);
    frame.render_widget(
        Paragraph::new(left).style(Style::default().bg(DEFAULT_THEME.current_line_bg)),
        layout[0],
    );

    let keys = Span::styled(
        " ^S commit  F2 view  PgUp/PgDn  ^Q quit ",
        Style::default().fg(DEFAULT_THEME.cursor),
    );
    frame.render_widget(
        Paragraph::new(Line::from(keys))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Right),
        layout[1],
    );
}
