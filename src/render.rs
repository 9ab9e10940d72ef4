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

//! Frame composition
//!
//! Turns the script and current playback state into styled lines. Output
//! devices live in `surface`; nothing here touches the terminal.

use crate::state::PlaybackState;
use crate::types::{AnalysisPanel, PanelSection, Script};

pub const PROMPT: &str = "$ ";
pub const CURSOR: &str = "█";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,
    Stars,
    Prompt,
    Command,
    Cursor,
    Output,
    Warning,
    Suggestion,
    AutoFix,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}

impl Span {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    fn blank() -> Self {
        Self::default()
    }

    fn single(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            spans: vec![Span::new(text, tone)],
        }
    }

    fn push(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.spans.push(Span::new(text, tone));
        self
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A decorative glyph placed by a backdrop, drawn beneath the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub col: u16,
    pub row: u16,
    pub glyph: char,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<Line>,
    pub sprites: Vec<Sprite>,
    pub finished: bool,
}

impl Frame {
    pub fn text(&self) -> Vec<String> {
        self.lines.iter().map(Line::text).collect()
    }
}

fn header(title: &str, stars: Option<u64>) -> Line {
    let line = Line::single(title, Tone::Title);
    match stars {
        Some(count) => line.push("  ", Tone::Title).push(format!("★ {count}"), Tone::Stars),
        None => line,
    }
}

fn command_line(text: &str) -> Line {
    Line::single(PROMPT, Tone::Prompt).push(text, Tone::Command)
}

fn panel_lines(panel: &AnalysisPanel, lines: &mut Vec<Line>) {
    for section in &panel.sections {
        match section {
            PanelSection::Warning(text) => {
                lines.push(Line::single("⚠ WARNING: ", Tone::Warning).push(text, Tone::Output));
            }
            PanelSection::Suggestion(text) => {
                lines.push(
                    Line::single("✓ SUGGESTION: ", Tone::Suggestion).push(text, Tone::Output),
                );
            }
            PanelSection::AutoFix { path, code } => {
                lines.push(
                    Line::single("🛠️ AUTO-FIX GENERATED", Tone::AutoFix)
                        .push("  ", Tone::Output)
                        .push(path, Tone::Code),
                );
                for row in code {
                    lines.push(Line::single(format!("  {row}"), Tone::Code));
                }
            }
        }
    }
}

pub fn compose(script: &Script, state: &PlaybackState, title: &str, stars: Option<u64>) -> Frame {
    let mut lines = vec![header(title, stars), Line::blank()];

    for &index in state.completed() {
        let entry = &script.entries[index];
        lines.push(command_line(&entry.display_text));
        for output in &entry.output_lines {
            lines.push(Line::single(output.as_str(), Tone::Output));
        }
    }

    if let Some(index) = state.in_progress() {
        let entry = &script.entries[index];
        lines.push(command_line(entry.typed_prefix(state.typed_len())).push(CURSOR, Tone::Cursor));
    }

    let finished = state.completed().len() == script.len();
    if finished && !script.panel.is_empty() {
        lines.push(Line::blank());
        panel_lines(&script.panel, &mut lines);
    }

    Frame {
        lines,
        sprites: Vec::new(),
        finished,
    }
}
