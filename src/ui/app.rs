//! Main TUI application state and event loop

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use tracing::info;

use super::editor::EditorBuffer;
use super::panes::{render_editor_pane, render_preview_pane, render_status_bar, PreviewMode};
use crate::playground::Playground;

const PAGE: usize = 20;

pub struct App {
    pub playground: Playground,
    pub editor: EditorBuffer,
    pub preview_mode: PreviewMode,
    pub preview_scroll: u16,
    pub status_message: String,
    pub should_quit: bool,
}

impl App {
    pub fn new(playground: Playground) -> Self {
        let editor = EditorBuffer::new(playground.text(), playground.editor_config().tab_width);
        App {
            playground,
            editor,
            preview_mode: PreviewMode::Text,
            preview_scroll: 0,
            status_message: String::from("Ready"),
            should_quit: false,
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0]);

        render_editor_pane(frame, columns[0], &mut self.editor);
        render_preview_pane(
            frame,
            columns[1],
            self.playground.result(),
            self.preview_mode,
            self.preview_scroll,
        );
        render_status_bar(
            frame,
            rows[1],
            &self.status_message,
            self.playground.result(),
            self.playground.revision(),
        );
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => self.should_quit = true,
            KeyCode::Char('s') if ctrl => {
                self.playground.commit(&self.editor);
                self.status_message = "Committed".to_string();
                info!(revision = self.playground.revision(), "manual commit");
            }
            KeyCode::F(2) => {
                self.preview_mode = self.preview_mode.toggle();
                self.preview_scroll = 0;
            }
            KeyCode::Char(c) if !ctrl => {
                self.editor.insert_char(c);
                self.changed();
            }
            KeyCode::Tab => {
                self.editor.insert_tab();
                self.changed();
            }
            KeyCode::Enter => {
                self.editor.newline();
                self.changed();
            }
            KeyCode::Backspace => {
                if self.editor.backspace() {
                    self.changed();
                }
            }
            KeyCode::Delete => {
                if self.editor.delete() {
                    self.changed();
                }
            }
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(1),
            KeyCode::Down => self.editor.move_down(1),
            KeyCode::Home => self.editor.home(),
            KeyCode::End => self.editor.end(),
            KeyCode::PageUp if ctrl => {
                self.preview_scroll = self.preview_scroll.saturating_sub(PAGE as u16)
            }
            KeyCode::PageDown if ctrl => {
                self.preview_scroll = self.preview_scroll.saturating_add(PAGE as u16)
            }
            KeyCode::PageUp => self.editor.move_up(PAGE),
            KeyCode::PageDown => self.editor.move_down(PAGE),
            _ => {}
        }
    }

    fn changed(&mut self) {
        let text = self.editor.text();
        let ok = self.playground.on_change(&text).is_success();
        self.status_message = if ok {
            "Rendered".to_string()
        } else {
            "Render failed".to_string()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RenderOptions;
    use crate::playground::EditorConfig;
    use crate::source::SourceBuffer;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(source: &str) -> App {
        App::new(Playground::with_source(
            SourceBuffer::new(source),
            RenderOptions::default(),
            EditorConfig::default(),
        ))
    }

    #[test]
    fn test_typing_rerenders() {
        let mut app = app("function Component() { return <p>a</p>; }");
        assert!(app.playground.result().is_success());
        app.editor.end();
        app.handle_key_event(key(KeyCode::Char('<')));
        assert!(!app.playground.result().is_success());
        assert_eq!(app.status_message, "Render failed");
        app.handle_key_event(key(KeyCode::Backspace));
        assert!(app.playground.result().is_success());
    }

    #[test]
    fn test_ctrl_keys() {
        let mut app = app("function Component() { return null; }");
        let revision = app.playground.revision();
        app.handle_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.playground.revision(), revision + 1);
        assert_eq!(app.editor.text(), "function Component() { return null; }");
        app.handle_key_event(key(KeyCode::F(2)));
        assert_eq!(app.preview_mode, PreviewMode::Tree);
        app.handle_key_event(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
