//! Full-screen alert for errors the user has to acknowledge.
//!
//! Used for missing files and failed trims or shares while a terminal screen
//! is up; the command-line paths print to stderr instead.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ALERT_BG: Color = Color::Rgb(200, 0, 0);
const ALERT_FG: Color = Color::Rgb(255, 255, 255);

/// Red full-screen alert that waits for a key press.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Enters the alternate screen.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(ErrorScreen { terminal })
    }

    /// Shows `title` and `message` centered until any key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, title: &str, message: &str) -> anyhow::Result<()> {
        self.terminal
            .draw(|frame| render_alert(frame, title, message))?;
        wait_for_key()
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Draws the alert over the whole frame. Screens that already own the terminal
/// call this directly instead of opening an [`ErrorScreen`].
pub fn render_alert(frame: &mut Frame, title: &str, message: &str) {
    let area = frame.area();
    frame.render_widget(
        Paragraph::new("").style(Style::default().bg(ALERT_BG)),
        area,
    );

    let text = vec![
        Line::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Line::raw(""),
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::styled("press any key", Style::default().add_modifier(Modifier::DIM)),
    ];

    let width = (area.width * 80) / 100;
    let centered = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height / 3,
        width,
        height: area.height - area.height / 3,
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(ALERT_FG).bg(ALERT_BG))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        centered,
    );
}

/// Blocks until a key is pressed.
///
/// # Errors
/// - If event polling fails
pub fn wait_for_key() -> anyhow::Result<()> {
    loop {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(());
                }
            }
        }
    }
}

/// Shows a one-off alert and restores the terminal afterwards.
///
/// # Errors
/// - If the terminal cannot be driven
pub fn show_alert(title: &str, message: &str) -> anyhow::Result<()> {
    tracing::warn!("{}: {}", title, message);
    let mut screen = ErrorScreen::new()?;
    screen.show_error(title, message)?;
    screen.cleanup()
}
