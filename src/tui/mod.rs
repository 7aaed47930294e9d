//! Ratatui-based calibration display.
//!
//! `lum measure` fills the terminal with a flat grey swatch at the current
//! stepper intensity so it can be read with a light meter. Keys:
//!
//! - `1` darker, `2` brighter (clamped, no wraparound)
//! - `4` show/hide the step overlay
//! - `Esc` / `q` quit

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Paragraph},
};
use tracing::info;

use crate::error::AppError;

pub mod stepper;

pub use stepper::{DEFAULT_STEPS, StepCommand, Stepper};

/// Start the calibration display with `steps` intensity levels.
pub fn run_measure(steps: usize) -> Result<(), AppError> {
    let mut stepper = Stepper::new(steps)?;
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::Terminal(format!("Failed to initialize terminal: {e}")))?;
    terminal
        .hide_cursor()
        .map_err(|e| AppError::Terminal(format!("Failed to hide cursor: {e}")))?;

    event_loop(&mut terminal, &mut stepper)?;
    info!(last_step = stepper.index() + 1, "calibration display closed");
    Ok(())
}

/// Ensures the terminal is restored (raw mode, alternate screen, cursor) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::Terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::Terminal(format!(
                "Failed to enter alternate screen: {e}"
            )));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = restore_screen(&mut io::stdout());
    }
}

fn restore_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, Show, LeaveAlternateScreen)
}

/// Map a key to a stepper command.
pub fn command_for(code: KeyCode) -> Option<StepCommand> {
    match code {
        KeyCode::Char('1') => Some(StepCommand::Darker),
        KeyCode::Char('2') => Some(StepCommand::Brighter),
        KeyCode::Char('4') => Some(StepCommand::ToggleOverlay),
        KeyCode::Esc | KeyCode::Char('q') => Some(StepCommand::Stop),
        _ => None,
    }
}

fn event_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    stepper: &mut Stepper,
) -> Result<(), AppError> {
    let mut needs_redraw = true;
    while stepper.is_running() {
        if needs_redraw {
            terminal
                .draw(|f| draw(f, stepper))
                .map_err(|e| AppError::Terminal(format!("Terminal draw error: {e}")))?;
            needs_redraw = false;
        }

        if !event::poll(Duration::from_millis(100))
            .map_err(|e| AppError::Terminal(format!("Event poll error: {e}")))?
        {
            continue;
        }

        match event::read().map_err(|e| AppError::Terminal(format!("Event read error: {e}")))? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(command) = command_for(key.code) {
                    stepper.apply(command);
                    needs_redraw = true;
                }
            }
            Event::Resize(_, _) => needs_redraw = true,
            _ => {}
        }
    }
    Ok(())
}

fn draw(frame: &mut ratatui::Frame<'_>, stepper: &Stepper) {
    let area = frame.area();
    let grey = stepper.grey_level();
    let swatch = Block::default().style(Style::default().bg(Color::Rgb(grey, grey, grey)));
    frame.render_widget(swatch, area);

    if !stepper.overlay_visible() || area.height < 3 {
        return;
    }

    let text = Text::from(vec![
        Line::from(format!("Pixel intensity: {:.3}", stepper.intensity())),
        Line::from(stepper.step_label()),
    ]);
    let overlay = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Green).bg(Color::Rgb(grey, grey, grey)));
    let rect = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(3),
        width: area.width,
        height: 2,
    };
    frame.render_widget(overlay, rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn key_mapping() {
        assert_eq!(command_for(KeyCode::Char('1')), Some(StepCommand::Darker));
        assert_eq!(command_for(KeyCode::Char('2')), Some(StepCommand::Brighter));
        assert_eq!(command_for(KeyCode::Char('4')), Some(StepCommand::ToggleOverlay));
        assert_eq!(command_for(KeyCode::Esc), Some(StepCommand::Stop));
        assert_eq!(command_for(KeyCode::Char('q')), Some(StepCommand::Stop));
        assert_eq!(command_for(KeyCode::Char('3')), None);
    }

    #[test]
    fn restore_shows_cursor_and_leaves_alternate_screen() {
        let mut out = Vec::new();
        restore_screen(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1b[?25h"), "{text:?}");
        assert!(text.contains("\x1b[?1049l"), "{text:?}");
    }

    #[test]
    fn draw_shows_overlay_text() {
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        let stepper = Stepper::new(DEFAULT_STEPS).unwrap();
        terminal.draw(|f| draw(f, &stepper)).unwrap();

        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect();
        assert!(rows.iter().any(|r| r.contains("Step 1 out of 17")), "{rows:?}");
        assert_eq!(buffer[(0, 0)].bg, Color::Rgb(0, 0, 0));
    }
}
