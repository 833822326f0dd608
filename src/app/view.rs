//! Screen layout.
//!
//! ```text
//! ┌ Host ─────────────────────────────┐
//! │ r1.lab                            │
//! └───────────────────────────────────┘
//! ┌ Configuration ────────────────────┐
//! │ ! Do not include 'conf t', ...    │
//! │                                   │
//! └───────────────────────────────────┘
//!          ┌─────────────────┐
//!          │   Configure!    │
//!          └─────────────────┘
//! status
//! key help
//! ```

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use super::{App, Focus};

pub const HOST_PLACEHOLDER: &str = "Enter device hostname/IP...";
pub const BUTTON_LABEL: &str = "Configure!";
const BUTTON_WIDTH: u16 = 24;
const HELP: &str = "Tab next field | Ctrl+S configure | Esc cancel | Ctrl+Q quit";

pub fn render(frame: &mut Frame, app: &App) {
    let [host_area, editor_area, button_row, status_area, help_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_host(frame, app, host_area);
    render_editor(frame, app, editor_area);

    let [button_area] = Layout::horizontal([Constraint::Length(BUTTON_WIDTH)])
        .flex(Flex::Center)
        .areas(button_row);
    render_button(frame, app, button_area);

    frame.render_widget(
        Paragraph::new(app.status()).style(Style::default().fg(Color::Yellow)),
        status_area,
    );
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().add_modifier(Modifier::DIM)),
        help_area,
    );
}

fn block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::bordered().title(title).border_style(border)
}

fn render_host(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus() == Focus::Host;
    let block = block(" Host ", focused);
    let inner = block.inner(area);
    let input = app.host();

    let scroll = input.visual_scroll(inner.width as usize);
    let line = if input.value().is_empty() {
        Line::from(Span::styled(
            HOST_PLACEHOLDER,
            Style::default().add_modifier(Modifier::DIM),
        ))
    } else {
        Line::from(input.value())
    };
    frame.render_widget(
        Paragraph::new(line).block(block).scroll((0, scroll as u16)),
        area,
    );

    if focused {
        let x = input.visual_cursor().saturating_sub(scroll) as u16;
        frame.set_cursor_position(Position::new(inner.x + x, inner.y));
    }
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let editor = app.editor();
    let focused = app.focus() == Focus::Editor;
    let title = if editor.is_loading() {
        " Configuration (loading...) "
    } else {
        " Configuration "
    };
    let block = block(title, focused);
    let inner = block.inner(area);

    let (row, col) = editor.cursor();
    let top = row.saturating_sub(inner.height.saturating_sub(1) as usize);
    let left = col.saturating_sub(inner.width.saturating_sub(1) as usize);

    let lines: Vec<Line> = editor.lines().iter().map(|l| Line::from(l.as_str())).collect();
    let mut widget = Paragraph::new(lines)
        .block(block)
        .scroll((top as u16, left as u16));
    if editor.is_loading() {
        widget = widget.style(Style::default().add_modifier(Modifier::DIM));
    }
    frame.render_widget(widget, area);

    if focused && !editor.is_loading() {
        frame.set_cursor_position(Position::new(
            inner.x + (col - left) as u16,
            inner.y + (row - top) as u16,
        ));
    }
}

fn render_button(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus() == Focus::Button;
    let mut style = Style::default().add_modifier(Modifier::BOLD);
    if focused {
        style = style.add_modifier(Modifier::REVERSED);
    }
    if app.is_busy() {
        style = style.add_modifier(Modifier::DIM);
    }

    frame.render_widget(
        Paragraph::new(BUTTON_LABEL)
            .alignment(Alignment::Center)
            .style(style)
            .block(block("", focused)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectError;
    use crate::platform::DeviceType;
    use crate::session::{ConfigSession, Credentials, DeviceConnector};
    use async_trait::async_trait;
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    struct Offline;

    #[async_trait]
    impl DeviceConnector for Offline {
        async fn detect_device_type(
            &self,
            host: &str,
            _credentials: &Credentials,
        ) -> Result<DeviceType, ConnectError> {
            Err(ConnectError::Unreachable(host.to_string()))
        }

        async fn open_session(
            &self,
            host: &str,
            _credentials: &Credentials,
            _device_type: DeviceType,
        ) -> Result<Box<dyn ConfigSession>, ConnectError> {
            Err(ConnectError::Unreachable(host.to_string()))
        }
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).expect("terminal");
        terminal.draw(|frame| render(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_placeholder_seed_and_button() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let app = App::new(
            Arc::new(Offline),
            Credentials::new("admin", "admin"),
            rt.handle().clone(),
        );

        let text = screen(&app);
        assert!(text.contains(HOST_PLACEHOLDER));
        assert!(text.contains("! Do not include 'conf t'"));
        assert!(text.contains(BUTTON_LABEL));
        assert!(!text.contains("loading"));
    }

    #[test]
    fn loading_shows_in_editor_title() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let mut app = App::new(
            Arc::new(Offline),
            Credentials::new("admin", "admin"),
            rt.handle().clone(),
        );
        app.on_submit();

        let text = screen(&app);
        assert!(text.contains("Configuration (loading...)"));
        assert!(text.contains("Configuring"));
    }
}
