//! Terminal user interface for the recorder screen.
//!
//! Renders the current session state, the elapsed (or remaining) time and the
//! control labels, and turns key presses into [`RecorderCommand`]s. The screen
//! holds no state of its own beyond a transient notice; everything it shows
//! comes from a [`SessionView`].

use crate::session::{format_mmss, mic_label, play_label, RecorderState, SessionView};
use crate::ui::{render_alert, wait_for_key};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::{Block, Padding, Paragraph},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(206, 224, 220);
const HELP_FG: Color = Color::Rgb(100, 100, 100);
const NOTICE_FG: Color = Color::Rgb(185, 207, 212);

/// How long a notice stays in the footer.
const NOTICE_TTL: Duration = Duration::from_secs(3);

/// User input on the recorder screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    /// No key, or a key with no binding
    Continue,
    /// Microphone button: start, pause or resume (Space)
    Mic,
    /// Stop recording or playback ('s')
    Stop,
    /// Play or pause the last recording ('p')
    TogglePlay,
    /// Back to idle ('r')
    Restart,
    /// Open the recordings list ('h')
    OpenList,
    /// Leave the app (Escape, 'q', Ctrl+C)
    Quit,
}

/// Maps a key press to a recorder command.
pub fn command_for_key(key: KeyEvent) -> RecorderCommand {
    if key.kind == KeyEventKind::Release {
        return RecorderCommand::Continue;
    }
    match key.code {
        KeyCode::Char(' ') => RecorderCommand::Mic,
        KeyCode::Char('s') => RecorderCommand::Stop,
        KeyCode::Char('p') => RecorderCommand::TogglePlay,
        KeyCode::Char('r') => RecorderCommand::Restart,
        KeyCode::Char('h') => RecorderCommand::OpenList,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            RecorderCommand::Quit
        }
        KeyCode::Char('q') | KeyCode::Esc => RecorderCommand::Quit,
        _ => RecorderCommand::Continue,
    }
}

/// Time shown on screen: remaining time while a track is loaded, recorded time otherwise.
pub fn display_time(view: &SessionView) -> String {
    match view.state {
        RecorderState::Playing | RecorderState::PlayPaused => format_mmss(view.play_elapsed),
        _ => format_mmss(view.elapsed),
    }
}

fn indicator(state: RecorderState) -> Span<'static> {
    match state {
        RecorderState::Recording => Span::styled("● ", Style::default().fg(Color::Red)),
        RecorderState::Paused | RecorderState::PlayPaused => {
            Span::styled("⏸ ", Style::default().fg(Color::Yellow))
        }
        RecorderState::Playing => Span::styled("▶ ", Style::default().fg(Color::Green)),
        RecorderState::Idle | RecorderState::Stopped => {
            Span::styled("■ ", Style::default().fg(HELP_FG))
        }
    }
}

/// Recorder screen bound to the terminal's alternate screen.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    notice: Option<(String, Instant)>,
}

impl RecorderTui {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            notice: None,
        })
    }

    /// Shows `message` in the footer for a few seconds.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some((message.into(), Instant::now()));
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, view: &SessionView) -> Result<()> {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }

        let notice = self.notice.as_ref().map(|(text, _)| text.clone());
        let time = display_time(view);
        let state = view.state;
        let subject = view
            .file
            .as_ref()
            .and_then(|file| file.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let block = Block::default()
                .padding(Padding::uniform(1))
                .style(Style::default().bg(BG).fg(FG));
            frame.render_widget(&block, area);
            let inner = block.inner(area);

            let [header_area, body_area, footer_area] = Layout::vertical([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .areas(inner);

            let header = Paragraph::new(Line::from(vec![
                Span::styled("clipdeck", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {subject}"), Style::default().fg(HELP_FG)),
            ]));
            frame.render_widget(header, header_area);

            let [_, time_area, state_area, _] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .areas(body_area);

            let time_line = Line::from(vec![
                indicator(state),
                Span::styled(time, Style::default().add_modifier(Modifier::BOLD)),
            ]);
            frame.render_widget(
                Paragraph::new(time_line).alignment(Alignment::Center),
                time_area,
            );
            frame.render_widget(
                Paragraph::new(state.to_string())
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(HELP_FG)),
                state_area,
            );

            let [notice_area, help_area] =
                Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(footer_area);
            if let Some(text) = notice {
                frame.render_widget(
                    Paragraph::new(text)
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(NOTICE_FG)),
                    notice_area,
                );
            }

            let help = format!(
                "space {}, s stop, p {}, r restart, h recordings, esc/q quit",
                mic_label(state).to_lowercase(),
                play_label(state).to_lowercase()
            );
            frame.render_widget(
                Paragraph::new(help)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(HELP_FG)),
                help_area,
            );
        })?;

        Ok(())
    }

    /// Covers the screen with an alert until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn alert(&mut self, title: &str, message: &str) -> Result<()> {
        tracing::warn!("{}: {}", title, message);
        self.terminal
            .draw(|frame| render_alert(frame, title, message))?;
        wait_for_key()
    }

    /// Waits up to `timeout` for a key and returns the matching command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> Result<RecorderCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let command = command_for_key(key);
                if command != RecorderCommand::Continue {
                    tracing::debug!("Key {:?} -> {:?}", key.code, command);
                }
                return Ok(command);
            }
        }
        Ok(RecorderCommand::Continue)
    }

    /// Leaves the alternate screen and restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecorderTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
