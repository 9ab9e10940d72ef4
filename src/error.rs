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

//! Error types

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Line {line}: Parse error: {message}")]
    Syntax { line: usize, message: String },

    #[error("Line {line}: Unexpected text after directive: '{text}'")]
    UnexpectedText { line: usize, text: String },

    #[error("Line {line}: Output line before any '$' command")]
    OrphanOutput { line: usize },

    #[error("Line {line}: Code line before any '! autofix:' block")]
    OrphanCode { line: usize },

    #[error("Line {line}: {name} must be {expected}, got {value}")]
    OutOfRange {
        line: usize,
        name: &'static str,
        expected: &'static str,
        value: f64,
    },
}

#[derive(Debug, Error)]
pub enum StarError {
    #[error("request failed: {0}")]
    Request(#[from] Box<ureq::Error>),

    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),

    #[error("malformed repository metadata: {0}")]
    Malformed(#[from] serde_json::Error),
}
