// Copyright (C) 2025  Tom Waddington
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Output surfaces for composed frames
//!
//! Handles the alternate screen and drawing styled lines with crossterm

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{IsTerminal, Write};
use unicode_width::UnicodeWidthStr;

use crate::render::{Frame, Tone};

pub trait Surface: Send {
    /// Columns and rows available for drawing.
    fn size(&self) -> (u16, u16);

    fn draw(&mut self, frame: &Frame) -> Result<()>;
}

// RAII guard for the alternate screen - only enters it if stdout is a TTY
struct ScreenGuard {
    enabled: bool,
}

impl ScreenGuard {
    fn new() -> Result<Self> {
        let enabled = if std::io::stdout().is_terminal() {
            execute!(std::io::stdout(), EnterAlternateScreen, Hide)
                .context("Failed to enter alternate screen")?;
            true
        } else {
            false
        };
        Ok(ScreenGuard { enabled })
    }

    #[cfg(test)]
    fn disabled() -> Self {
        ScreenGuard { enabled: false }
    }

    fn release(&mut self) {
        if self.enabled {
            let _ = execute!(std::io::stdout(), Show, LeaveAlternateScreen);
            self.enabled = false;
        }
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        self.release();
    }
}

// Longest prefix of `text` that fits in `room` terminal cells, and its width
fn fit_width(text: &str, room: usize) -> (&str, usize) {
    let mut end = 0;
    let mut used = 0;
    for (i, c) in text.char_indices() {
        let next = i + c.len_utf8();
        let width = text[..next].width();
        if width > room {
            break;
        }
        end = next;
        used = width;
    }
    (&text[..end], used)
}

fn color(tone: Tone) -> Color {
    match tone {
        Tone::Title => Color::White,
        Tone::Stars => Color::Yellow,
        Tone::Prompt | Tone::Cursor | Tone::Suggestion => Color::Green,
        Tone::Command => Color::White,
        Tone::Output => Color::Grey,
        Tone::Warning => Color::Yellow,
        Tone::AutoFix => Color::Magenta,
        Tone::Code => Color::Cyan,
    }
}

/// Redraws the whole screen for every frame.
///
/// A finished session is printed again on the main screen when the surface
/// is dropped, so it stays readable after the alternate screen is left.
pub struct TerminalSurface<W: Write + Send> {
    out: W,
    fixed_size: Option<(u16, u16)>,
    finished: Option<Vec<String>>,
    screen_guard: ScreenGuard,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout() -> Result<Self> {
        let screen_guard = ScreenGuard::new()?;
        Ok(Self {
            out: std::io::stdout(),
            fixed_size: None,
            finished: None,
            screen_guard,
        })
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    /// A surface over any writer with a fixed size; leaves the real terminal alone.
    #[cfg(test)]
    pub fn with_writer(out: W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            fixed_size: Some((cols, rows)),
            finished: None,
            screen_guard: ScreenGuard::disabled(),
        }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Leaves the alternate screen and prints the finished session, if any.
    fn leave(&mut self) -> Result<()> {
        self.screen_guard.release();
        if let Some(lines) = self.finished.take() {
            for line in lines {
                writeln!(self.out, "{line}").context("Failed to write transcript")?;
            }
            self.out.flush()?;
        }
        Ok(())
    }
}

impl<W: Write + Send> Drop for TerminalSurface<W> {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl<W: Write + Send> Surface for TerminalSurface<W> {
    fn size(&self) -> (u16, u16) {
        self.fixed_size
            .unwrap_or_else(|| terminal::size().unwrap_or((80, 24)))
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let (cols, rows) = self.size();
        queue!(self.out, Clear(ClearType::All)).context("Failed to clear screen")?;

        for sprite in frame.sprites.iter().filter(|s| s.col < cols && s.row < rows) {
            queue!(
                self.out,
                MoveTo(sprite.col, sprite.row),
                SetForegroundColor(Color::DarkGrey),
                Print(sprite.glyph),
            )?;
        }

        // Keep the bottom of the session in view, like a scrolling terminal
        let skip = frame.lines.len().saturating_sub(rows as usize);
        for (row, line) in frame.lines.iter().skip(skip).enumerate() {
            queue!(self.out, MoveTo(0, row as u16))?;
            let mut room = cols as usize;
            for span in &line.spans {
                if room == 0 {
                    break;
                }
                let (text, width) = fit_width(&span.text, room);
                room -= width;
                queue!(self.out, SetForegroundColor(color(span.tone)))?;
                if span.tone == Tone::Cursor {
                    queue!(self.out, SetAttribute(Attribute::SlowBlink))?;
                }
                queue!(self.out, Print(text), SetAttribute(Attribute::Reset))?;
            }
        }

        queue!(self.out, ResetColor)?;
        self.out.flush().context("Failed to flush terminal")?;

        if frame.finished {
            self.finished = Some(frame.text());
        }
        Ok(())
    }
}

/// Prints the finished session once as plain text, for non-interactive output.
pub struct TranscriptSurface<W: Write + Send> {
    out: W,
    printed: bool,
}

impl<W: Write + Send> TranscriptSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: false,
        }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write + Send> Surface for TranscriptSurface<W> {
    fn size(&self) -> (u16, u16) {
        (u16::MAX, u16::MAX)
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        if self.printed || !frame.finished {
            return Ok(());
        }
        for line in frame.text() {
            writeln!(self.out, "{line}").context("Failed to write transcript")?;
        }
        self.out.flush()?;
        self.printed = true;
        Ok(())
    }
}
