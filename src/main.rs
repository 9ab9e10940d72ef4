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

mod backdrop;
mod config;
mod error;
mod logging;
mod parser;
mod playback;
mod render;
mod stars;
mod state;
mod surface;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::sync::watch;

use crate::backdrop::{Backdrop, NoBackdrop, Starfield};
use crate::config::{MAX_DELAY_SECS, Overrides, PlaybackConfig, is_valid_delay};
use crate::playback::PlaybackEngine;
use crate::stars::{DEFAULT_REPO, GithubStars};
use crate::surface::{Surface, TerminalSurface, TranscriptSurface};
use crate::types::Script;

const BUILTIN_SCRIPT: &str = include_str!("../scripts/container-diet.dcs");

/// Replay a scripted container-diet terminal session
#[derive(Parser, Debug)]
#[command(name = "dietcast", version, about)]
struct Cli {
    /// Script file to play instead of the built-in demo
    script: Option<PathBuf>,

    /// Seconds per typed character
    #[arg(long, value_parser = parse_seconds)]
    speed: Option<f64>,

    /// Seconds to pause after a command is fully typed
    #[arg(long, value_parser = parse_seconds)]
    pause: Option<f64>,

    /// Random keystroke variation as a fraction of speed (0.0 to 1.0)
    #[arg(long, value_parser = parse_fraction)]
    jitter: Option<f64>,

    /// GitHub repository whose star count is shown in the header
    #[arg(long, default_value = DEFAULT_REPO)]
    repo: String,

    /// Do not fetch the star count
    #[arg(long)]
    no_stars: bool,

    /// Draw the animated backdrop
    #[arg(long)]
    backdrop: bool,

    /// Exit as soon as the session has finished instead of waiting for Ctrl-C
    #[arg(long)]
    exit_when_done: bool,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_seconds(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if is_valid_delay(value) {
        Ok(value)
    } else {
        Err(format!("expected between 0 and {MAX_DELAY_SECS} seconds, got {s}"))
    }
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("expected a value between 0.0 and 1.0, got {s}"))
    }
}

fn load_script(path: Option<&PathBuf>) -> Result<Script> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read script file {}", path.display()))?;
            parser::parse_script(&content)
                .with_context(|| format!("Failed to parse script file {}", path.display()))
        }
        None => parser::parse_script(BUILTIN_SCRIPT).context("Failed to parse built-in script"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
    logging::init(&log_path)?;

    let script = load_script(cli.script.as_ref())?;
    let overrides = Overrides {
        speed: cli.speed,
        pause: cli.pause,
        jitter: cli.jitter,
    };
    let config = PlaybackConfig::resolve(&script.settings, &overrides);
    tracing::info!(entries = script.len(), ?config, "loaded script");

    let interactive = std::io::stdout().is_terminal();
    let surface: Box<dyn Surface> = if interactive {
        Box::new(TerminalSurface::stdout()?)
    } else {
        Box::new(TranscriptSurface::new(std::io::stdout()))
    };
    let backdrop: Box<dyn Backdrop> = if cli.backdrop && interactive {
        Box::new(Starfield::new(48, 5))
    } else {
        Box::new(NoBackdrop)
    };
    let stars = if cli.no_stars {
        stars::disabled()
    } else {
        stars::spawn_fetch(GithubStars::new(&cli.repo))
    };

    // Nothing to wait for without a screen to look at
    let exit_when_done = cli.exit_when_done || !interactive;

    let mut handle = PlaybackEngine::new(script, config, surface)
        .with_backdrop(backdrop)
        .with_stars(stars)
        .exit_when_done(exit_when_done)
        .spawn();

    let (interrupt_tx, mut interrupted) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(true);
    })?;

    let outcome = tokio::select! {
        outcome = handle.finished() => outcome?,
        _ = interrupted.changed() => {
            tracing::info!(completed = handle.state().completed().len(), "interrupted");
            handle.unmount().await?
        }
    };
    tracing::info!(?outcome, "exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PanelSection;

    #[test]
    fn test_builtin_script() {
        let script = load_script(None).unwrap();
        assert_eq!(script.len(), 1);
        let entry = &script.entries[0];
        assert_eq!(entry.display_text, "container-diet analyze python:3.9 --auto-fix");
        assert_eq!(entry.output_lines.len(), 11);
        assert_eq!(entry.output_lines[3], "");
        assert_eq!(script.settings.speed, Some(0.06));
        assert_eq!(script.settings.pause, Some(0.5));

        assert_eq!(script.panel.sections.len(), 3);
        match &script.panel.sections[2] {
            PanelSection::AutoFix { path, code } => {
                assert_eq!(path, "Dockerfile.diet");
                assert_eq!(code.len(), 5);
                assert_eq!(code[3], "    libpq5 && rm -rf /var/lib/apt/lists/*");
            }
            other => panic!("Expected auto-fix section, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["dietcast", "demo.dcs", "--speed", "0.1", "--no-stars"]);
        assert_eq!(cli.script, Some(PathBuf::from("demo.dcs")));
        assert_eq!(cli.speed, Some(0.1));
        assert!(cli.no_stars);
        assert_eq!(cli.repo, DEFAULT_REPO);
    }

    #[test]
    fn test_cli_rejects_bad_jitter() {
        assert!(Cli::try_parse_from(["dietcast", "--jitter", "2"]).is_err());
        assert!(Cli::try_parse_from(["dietcast", "--pause", "-1"]).is_err());
    }

    #[test]
    fn test_cli_rejects_huge_delays() {
        assert!(Cli::try_parse_from(["dietcast", "--pause", "1e300"]).is_err());
        assert!(Cli::try_parse_from(["dietcast", "--speed", "1e300"]).is_err());
        assert!(Cli::try_parse_from(["dietcast", "--speed", "inf"]).is_err());

        let cli = Cli::try_parse_from(["dietcast", "--pause", "3600"]).unwrap();
        assert_eq!(cli.pause, Some(3600.0));
    }
}
