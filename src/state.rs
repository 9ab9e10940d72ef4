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

//! Playback state machine
//!
//! `Typing(i, n)` reveals one character of entry `i` per tick. Once the
//! whole display text is shown the next tick moves to `Pausing(i)`, and the
//! tick after the pause marks `i` completed and either starts typing `i + 1`
//! or reaches `Finished`. Timing lives in the engine; this module only counts.

use crate::types::Script;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Typing,
    Pausing,
    Finished,
}

/// What a call to [`PlaybackState::advance`] did, and so which timer to arm next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One more character revealed; arm the keystroke timer.
    Typed,
    /// Display text complete; arm the pause timer.
    Paused,
    /// Previous entry completed and the next one started; arm the keystroke timer.
    Advanced,
    /// Last entry completed; nothing further is scheduled.
    Finished,
    /// Already finished; nothing changed.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    active_index: usize,
    typed_len: usize,
    completed: Vec<usize>,
    phase: Phase,
}

impl PlaybackState {
    pub fn new(script: &Script) -> Self {
        let phase = if script.is_empty() {
            Phase::Finished
        } else {
            Phase::Typing
        };
        Self {
            active_index: 0,
            typed_len: 0,
            completed: Vec::new(),
            phase,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn typed_len(&self) -> usize {
        self.typed_len
    }

    pub fn completed(&self) -> &[usize] {
        &self.completed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Index of the entry still being typed or paused on, if any.
    pub fn in_progress(&self) -> Option<usize> {
        match self.phase {
            Phase::Typing | Phase::Pausing => Some(self.active_index),
            Phase::Finished => None,
        }
    }

    pub fn advance(&mut self, script: &Script) -> Step {
        match self.phase {
            Phase::Typing => {
                let len = script.entries[self.active_index].char_len();
                if self.typed_len < len {
                    self.typed_len += 1;
                    Step::Typed
                } else {
                    self.phase = Phase::Pausing;
                    Step::Paused
                }
            }
            Phase::Pausing => {
                self.completed.push(self.active_index);
                if self.active_index + 1 < script.len() {
                    self.active_index += 1;
                    self.typed_len = 0;
                    self.phase = Phase::Typing;
                    Step::Advanced
                } else {
                    self.active_index = script.len();
                    self.typed_len = 0;
                    self.phase = Phase::Finished;
                    Step::Finished
                }
            }
            Phase::Finished => Step::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entry;

    #[test]
    fn test_single_entry_plays_to_finish() {
        let script = Script::new(vec![Entry::new("ab").with_output(["x"])]);
        let mut state = PlaybackState::new(&script);
        assert_eq!(state.phase(), Phase::Typing);

        assert_eq!(state.advance(&script), Step::Typed);
        assert_eq!(state.advance(&script), Step::Typed);
        assert_eq!(state.typed_len(), 2);
        assert!(state.completed().is_empty());

        assert_eq!(state.advance(&script), Step::Paused);
        assert_eq!(state.phase(), Phase::Pausing);
        assert_eq!(state.typed_len(), 2);

        assert_eq!(state.advance(&script), Step::Finished);
        assert_eq!(state.completed(), &[0]);
        assert!(state.is_finished());
        assert_eq!(state.active_index(), 1);
    }

    #[test]
    fn test_typing_increments_by_one_and_stops_at_length() {
        let script = Script::new(vec![Entry::new("docker")]);
        let mut state = PlaybackState::new(&script);
        let mut previous = state.typed_len();
        while state.phase() == Phase::Typing {
            state.advance(&script);
            let now = state.typed_len();
            if state.phase() == Phase::Typing {
                assert_eq!(now, previous + 1);
            } else {
                assert_eq!(now, previous);
            }
            assert!(now <= 6);
            previous = now;
        }
        assert_eq!(state.typed_len(), 6);
    }

    #[test]
    fn test_second_entry_starts_from_zero() {
        let script = Script::new(vec![
            Entry::new("a").with_output(["1"]),
            Entry::new("bc").with_output(["2"]),
        ]);
        let mut state = PlaybackState::new(&script);
        state.advance(&script); // "a"
        state.advance(&script); // pause
        assert_eq!(state.advance(&script), Step::Advanced);
        assert_eq!(state.active_index(), 1);
        assert_eq!(state.typed_len(), 0);
        assert_eq!(state.completed(), &[0]);
        assert_eq!(state.phase(), Phase::Typing);
    }

    #[test]
    fn test_advance_after_finish_is_idle() {
        let script = Script::new(vec![Entry::new("")]);
        let mut state = PlaybackState::new(&script);
        assert_eq!(state.advance(&script), Step::Paused);
        assert_eq!(state.advance(&script), Step::Finished);
        let snapshot = state.clone();
        for _ in 0..5 {
            assert_eq!(state.advance(&script), Step::Idle);
        }
        assert_eq!(state, snapshot);
        assert_eq!(state.completed(), &[0]);
    }

    #[test]
    fn test_completed_is_increasing_prefix() {
        let script = Script::new(vec![
            Entry::new("a"),
            Entry::new(""),
            Entry::new("xyz").with_output(["o"]),
        ]);
        let mut state = PlaybackState::new(&script);
        let mut steps = 0;
        while !state.is_finished() {
            state.advance(&script);
            let expected: Vec<usize> = (0..state.completed().len()).collect();
            assert_eq!(state.completed(), expected.as_slice());
            assert!(state.active_index() <= script.len());
            steps += 1;
        }
        // chars + one pause transition + one completion per entry
        assert_eq!(steps, 4 + 3 * 2);
        assert_eq!(state.completed(), &[0, 1, 2]);
    }

    #[test]
    fn test_empty_script_starts_finished() {
        let script = Script::default();
        let mut state = PlaybackState::new(&script);
        assert!(state.is_finished());
        assert_eq!(state.in_progress(), None);
        assert_eq!(state.advance(&script), Step::Idle);
    }
}
