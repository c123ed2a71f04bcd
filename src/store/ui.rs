//! Interactive terminal UI for browsing saved recordings.
//!
//! The browser only renders and interprets keys; it hands [`BrowserAction`]s
//! back to its caller, which owns the bridge and the store and performs them.
//! Playback status is passed in on every draw so the remaining time follows
//! the device.

use super::RecordingItem;
use crate::session::format_mmss;
use crate::ui::{render_alert, wait_for_key};
use anyhow::Result;
use chrono::{Local, TimeZone};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Padding, Paragraph},
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const TIMESTAMP_FG: Color = Color::Rgb(100, 100, 100);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);
const HELP_FG: Color = Color::Rgb(100, 100, 100);
const PLAYING_FG: Color = Color::Green;

/// How long a notification stays up.
const NOTIFICATION_TTL: Duration = Duration::from_millis(1500);

/// What the caller should do after a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserAction {
    Exit,
    /// Play the item, or pause/resume it if it is the one loaded
    TogglePlay(usize),
    Trim { index: usize, start: f64, end: f64 },
    Share(usize),
    Delete(usize),
}

/// Playback status of the loaded item, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub id: String,
    /// Seconds left in the track
    pub remaining: u64,
    pub paused: bool,
}

/// Which field of the trim form has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrimField {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Browsing,
    Trimming {
        index: usize,
        start: String,
        end: String,
        field: TrimField,
        error: Option<String>,
    },
    ConfirmDelete(usize),
}

/// Parses a trim window typed by the user and clamps it to `[0, duration]`.
///
/// # Errors
/// - If either bound is not a number
/// - If the clamped start is not before the clamped end
pub fn parse_trim_window(start: &str, end: &str, duration: u64) -> Result<(f64, f64), String> {
    let parse = |text: &str, what: &str| {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("{what} must be a number of seconds"))
    };
    let max = duration as f64;
    let start = parse(start, "Start")?.clamp(0.0, max);
    let end = parse(end, "End")?.clamp(0.0, max);
    if start >= end {
        return Err("Start must be less than end".to_string());
    }
    Ok((start, end))
}

/// Everything the browser shows, independent of the terminal.
pub struct BrowserState {
    items: Vec<RecordingItem>,
    list_state: ListState,
    mode: Mode,
    notification: Option<(String, Instant)>,
}

impl BrowserState {
    pub fn new(items: Vec<RecordingItem>) -> Self {
        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            items,
            list_state,
            mode: Mode::Browsing,
            notification: None,
        }
    }

    /// Replaces the list, keeping the selection in range.
    pub fn set_items(&mut self, items: Vec<RecordingItem>) {
        self.items = items;
        let selected = match (self.list_state.selected(), self.items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn items(&self) -> &[RecordingItem] {
        &self.items
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected().filter(|&i| i < self.items.len())
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some((message.into(), Instant::now()));
    }

    /// Interprets one key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<BrowserAction> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(BrowserAction::Exit);
        }

        match self.mode.clone() {
            Mode::Browsing => self.handle_browsing_key(key),
            Mode::ConfirmDelete(index) => {
                self.mode = Mode::Browsing;
                match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => Some(BrowserAction::Delete(index)),
                    _ => None,
                }
            }
            Mode::Trimming {
                index,
                mut start,
                mut end,
                mut field,
                ..
            } => {
                let mut error = None;
                match key.code {
                    KeyCode::Esc => {
                        self.mode = Mode::Browsing;
                        return None;
                    }
                    KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                        field = match field {
                            TrimField::Start => TrimField::End,
                            TrimField::End => TrimField::Start,
                        };
                    }
                    KeyCode::Backspace => {
                        match field {
                            TrimField::Start => start.pop(),
                            TrimField::End => end.pop(),
                        };
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => match field {
                        TrimField::Start => start.push(c),
                        TrimField::End => end.push(c),
                    },
                    KeyCode::Enter => {
                        let duration = self.items.get(index).map_or(0, |i| i.duration);
                        match parse_trim_window(&start, &end, duration) {
                            Ok((start, end)) => {
                                self.mode = Mode::Browsing;
                                return Some(BrowserAction::Trim { index, start, end });
                            }
                            Err(message) => error = Some(message),
                        }
                    }
                    _ => {}
                }
                self.mode = Mode::Trimming {
                    index,
                    start,
                    end,
                    field,
                    error,
                };
                None
            }
        }
    }

    fn handle_browsing_key(&mut self, key: KeyEvent) -> Option<BrowserAction> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(BrowserAction::Exit),
            KeyCode::Up => {
                self.list_state.select_previous();
                None
            }
            KeyCode::Down => {
                if let Some(i) = self.selected().filter(|&i| i + 1 < self.items.len()) {
                    self.list_state.select(Some(i + 1));
                }
                None
            }
            KeyCode::Enter | KeyCode::Char('p') => self.selected().map(BrowserAction::TogglePlay),
            KeyCode::Char('e') => self.selected().map(BrowserAction::Share),
            KeyCode::Char('d') => {
                if let Some(index) = self.selected() {
                    self.mode = Mode::ConfirmDelete(index);
                }
                None
            }
            KeyCode::Char('t') => {
                if let Some(index) = self.selected() {
                    self.mode = Mode::Trimming {
                        index,
                        start: "0".to_string(),
                        end: self.items[index].duration.to_string(),
                        field: TrimField::Start,
                        error: None,
                    };
                }
                None
            }
            _ => None,
        }
    }
}

/// Recordings list bound to the terminal's alternate screen.
pub struct RecordingsBrowser {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: BrowserState,
}

impl RecordingsBrowser {
    /// Enters the alternate screen with `items` listed.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    pub fn new(items: Vec<RecordingItem>) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        tracing::debug!("Recordings browser opened with {} items", items.len());
        Ok(Self {
            terminal,
            state: BrowserState::new(items),
        })
    }

    /// Waits up to `timeout` for a key and interprets it.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> Result<Option<BrowserAction>> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                return Ok(self.state.handle_key(key));
            }
        }
        Ok(None)
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

    /// Renders the list, the footer and any open form or notification.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self, playing: Option<&NowPlaying>) -> Result<()> {
        let state = &mut self.state;
        if state
            .notification
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
        {
            state.notification = None;
        }
        let notification = state.notification.as_ref().map(|(m, _)| m.clone());
        let mode = state.mode.clone();

        let items: Vec<ListItem> = state
            .items
            .iter()
            .map(|item| {
                let created = Local
                    .timestamp_millis_opt(item.created_at)
                    .single()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();

                let (length, style) = match playing.filter(|p| p.id == item.id) {
                    Some(now) => (
                        format!(
                            "{} {}",
                            if now.paused { "⏸" } else { "▶" },
                            format_mmss(now.remaining)
                        ),
                        Style::default().fg(PLAYING_FG),
                    ),
                    None => (format_mmss(item.duration), Style::default().fg(FG)),
                };

                ListItem::new(vec![
                    Line::styled(
                        format!("{created}  {length}"),
                        Style::default().fg(TIMESTAMP_FG),
                    ),
                    Line::styled(item.display_name().to_string(), style),
                ])
            })
            .collect();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let padding_block = Block::default()
                .padding(Padding::uniform(1))
                .style(Style::default().bg(BG));
            frame.render_widget(&padding_block, area);
            let inner = padding_block.inner(area);

            let [list_area, footer_area] =
                Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

            if items.is_empty() {
                frame.render_widget(
                    Paragraph::new("No recordings yet")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(HELP_FG))
                        .block(Block::default().title(" Recordings ").borders(Borders::ALL)),
                    list_area,
                );
            } else {
                let list = List::new(items)
                    .block(
                        Block::default()
                            .title(" Recordings ")
                            .borders(Borders::ALL)
                            .padding(Padding::bottom(1)),
                    )
                    .highlight_style(Style::default().bg(HIGHLIGHT_BG))
                    .highlight_symbol("> ")
                    .highlight_spacing(HighlightSpacing::Always);
                frame.render_stateful_widget(list, list_area, &mut state.list_state);
            }

            let help = match &mode {
                Mode::Browsing => "↑↓ select, ↵/p play, t trim, e share, d delete, esc/q back",
                Mode::Trimming { .. } => "tab switch field, ↵ trim, esc cancel",
                Mode::ConfirmDelete(_) => "y delete, any other key cancel",
            };
            frame.render_widget(
                Paragraph::new(help)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(HELP_FG)),
                footer_area,
            );

            match &mode {
                Mode::Trimming {
                    start,
                    end,
                    field,
                    error,
                    ..
                } => render_trim_form(frame, area, start, end, *field, error.as_deref()),
                Mode::ConfirmDelete(index) => {
                    let name = state
                        .items
                        .get(*index)
                        .map(|i| i.display_name().to_string())
                        .unwrap_or_default();
                    render_modal(frame, area, &format!("Delete {name}?"), Color::Red);
                }
                Mode::Browsing => {}
            }

            if let Some(message) = notification {
                render_modal(frame, area, &message, Color::Green);
            }
        })?;

        Ok(())
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        tracing::debug!("Recordings browser terminal cleanup complete");
        Ok(())
    }
}

impl Drop for RecordingsBrowser {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Centered single-line box.
fn render_modal(frame: &mut Frame, screen: Rect, message: &str, bg: Color) {
    let width = (message.chars().count() as u16)
        .saturating_add(4)
        .min(screen.width);
    let area = Rect {
        x: screen.x + screen.width.saturating_sub(width) / 2,
        y: screen.y + screen.height.saturating_sub(3) / 2,
        width,
        height: 3.min(screen.height),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(bg).fg(Color::Black));
    frame.render_widget(Clear, area);
    frame.render_widget(&block, area);
    frame.render_widget(
        Paragraph::new(message)
            .style(Style::default().bg(bg).fg(Color::Black))
            .alignment(Alignment::Center),
        block.inner(area),
    );
}

fn render_trim_form(
    frame: &mut Frame,
    screen: Rect,
    start: &str,
    end: &str,
    field: TrimField,
    error: Option<&str>,
) {
    let width = 40.min(screen.width);
    let height = 6.min(screen.height);
    let area = Rect {
        x: screen.x + screen.width.saturating_sub(width) / 2,
        y: screen.y + screen.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let focused = |f: TrimField| {
        if f == field {
            Style::default().fg(Color::Black).bg(FG)
        } else {
            Style::default().fg(FG)
        }
    };
    let lines = vec![
        Line::from(vec![
            Span::raw("Start (s): "),
            Span::styled(format!(" {start} "), focused(TrimField::Start)),
        ]),
        Line::from(vec![
            Span::raw("End (s):   "),
            Span::styled(format!(" {end} "), focused(TrimField::End)),
        ]),
        Line::styled(error.unwrap_or_default().to_string(), Style::default().fg(Color::Red)),
    ];

    let block = Block::default()
        .title(" Trim ")
        .borders(Borders::ALL)
        .style(Style::default().bg(BG).fg(FG));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
