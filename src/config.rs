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

//! Playback configuration
//!
//! Resolved from command-line flags, then script directives, then defaults.

use rand::Rng;
use std::time::Duration;

use crate::types::ScriptSettings;

pub const DEFAULT_TITLE: &str = "bash — container-diet";

/// Longest accepted speed or pause, in seconds.
pub const MAX_DELAY_SECS: f64 = 3600.0;

pub fn is_valid_delay(secs: f64) -> bool {
    (0.0..=MAX_DELAY_SECS).contains(&secs)
}

fn clamp_delay(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, MAX_DELAY_SECS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    // Base time between keystrokes in seconds
    pub speed: f64,
    // Pause after a command is fully typed, in seconds
    pub pause: f64,
    // Jitter as a fraction (0.0 to 1.0) of speed
    pub jitter: f64,
    // Redraw period for an animated backdrop
    pub frame_interval: Duration,
    pub title: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 0.06, // 60ms per keystroke
            pause: 0.5,  // 500ms before the next command
            jitter: 0.0, // No jitter
            frame_interval: Duration::from_millis(120),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub speed: Option<f64>,
    pub pause: Option<f64>,
    pub jitter: Option<f64>,
}

impl PlaybackConfig {
    pub fn resolve(settings: &ScriptSettings, overrides: &Overrides) -> Self {
        let defaults = Self::default();
        Self {
            speed: overrides.speed.or(settings.speed).unwrap_or(defaults.speed),
            pause: overrides.pause.or(settings.pause).unwrap_or(defaults.pause),
            jitter: overrides
                .jitter
                .or(settings.jitter)
                .unwrap_or(defaults.jitter)
                .clamp(0.0, 1.0),
            title: settings.title.clone().unwrap_or(defaults.title),
            ..defaults
        }
    }

    /// Delay before the next character, `speed` varied by up to `jitter * speed` either way.
    pub fn keystroke_delay(&self) -> Duration {
        let base_ms = (clamp_delay(self.speed) * 1000.0).round() as u64;
        let jitter_ms = (base_ms as f64 * self.jitter) as u64;

        if jitter_ms > 0 {
            let variation = rand::rng().random_range(0..=jitter_ms * 2);
            let delay = base_ms.saturating_add(variation).saturating_sub(jitter_ms);
            Duration::from_millis(delay)
        } else {
            Duration::from_millis(base_ms)
        }
    }

    pub fn pause_delay(&self) -> Duration {
        Duration::from_secs_f64(clamp_delay(self.pause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.keystroke_delay(), Duration::from_millis(60));
        assert_eq!(config.pause_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_precedence() {
        let settings = ScriptSettings {
            speed: Some(0.2),
            pause: Some(2.0),
            jitter: None,
            title: Some("zsh".to_string()),
        };
        let overrides = Overrides {
            speed: Some(0.01),
            ..Overrides::default()
        };
        let config = PlaybackConfig::resolve(&settings, &overrides);
        assert_eq!(config.speed, 0.01);
        assert_eq!(config.pause, 2.0);
        assert_eq!(config.jitter, 0.0);
        assert_eq!(config.title, "zsh");
    }

    #[test]
    fn test_oversized_delays_are_capped() {
        let config = PlaybackConfig {
            speed: 1e300,
            pause: 1e300,
            ..PlaybackConfig::default()
        };
        let cap = Duration::from_secs_f64(MAX_DELAY_SECS);
        assert_eq!(config.pause_delay(), cap);
        assert_eq!(config.keystroke_delay(), cap);
    }

    #[test]
    fn test_delay_bounds() {
        assert!(is_valid_delay(0.0));
        assert!(is_valid_delay(MAX_DELAY_SECS));
        assert!(!is_valid_delay(MAX_DELAY_SECS + 1.0));
        assert!(!is_valid_delay(1e300));
        assert!(!is_valid_delay(-0.1));
        assert!(!is_valid_delay(f64::NAN));
        assert!(!is_valid_delay(f64::INFINITY));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let config = PlaybackConfig {
            speed: 0.1,
            jitter: 0.5,
            ..PlaybackConfig::default()
        };
        for _ in 0..200 {
            let delay = config.keystroke_delay();
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(150));
        }
    }
}
