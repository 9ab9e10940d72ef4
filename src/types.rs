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

//! Core types for dietcast scripts

/// One typed command and the canned output printed after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub display_text: String,
    pub output_lines: Vec<String>,
}

impl Entry {
    pub fn new(display_text: impl Into<String>) -> Self {
        Self {
            display_text: display_text.into(),
            output_lines: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_output<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Length of the display text in characters, the unit typing advances by.
    pub fn char_len(&self) -> usize {
        self.display_text.chars().count()
    }

    /// The first `len` characters of the display text.
    pub fn typed_prefix(&self, len: usize) -> &str {
        match self.display_text.char_indices().nth(len) {
            Some((end, _)) => &self.display_text[..end],
            None => &self.display_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelSection {
    Warning(String),
    Suggestion(String),
    AutoFix { path: String, code: Vec<String> },
}

/// Static block revealed once every entry has been played.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisPanel {
    pub sections: Vec<PanelSection>,
}

impl AnalysisPanel {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Playback settings a script may carry; unset fields fall back to the CLI or defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptSettings {
    pub speed: Option<f64>,
    pub pause: Option<f64>,
    pub jitter: Option<f64>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub entries: Vec<Entry>,
    pub panel: AnalysisPanel,
    pub settings: ScriptSettings,
}

impl Script {
    #[cfg(test)]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
