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

//! Playback engine for dietcast scripts
//!
//! Drives the state machine from tokio timers and redraws after every change

use anyhow::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};

use crate::backdrop::{Backdrop, NoBackdrop};
use crate::config::PlaybackConfig;
use crate::render::compose;
use crate::state::{PlaybackState, Step};
use crate::stars;
use crate::surface::Surface;
use crate::types::Script;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every entry played and the engine was asked to exit when done.
    Finished,
    /// Torn down by a stop request.
    Stopped,
}

pub struct PlaybackEngine {
    script: Script,
    config: PlaybackConfig,
    state: PlaybackState,
    surface: Box<dyn Surface>,
    backdrop: Box<dyn Backdrop>,
    stars: watch::Receiver<Option<u64>>,
    exit_when_done: bool,
    published: watch::Sender<PlaybackState>,
    started: Instant,
}

impl PlaybackEngine {
    pub fn new(script: Script, config: PlaybackConfig, surface: Box<dyn Surface>) -> Self {
        let state = PlaybackState::new(&script);
        let (published, _) = watch::channel(state.clone());
        Self {
            script,
            config,
            state,
            surface,
            backdrop: Box::new(NoBackdrop),
            stars: stars::disabled(),
            exit_when_done: false,
            published,
            started: Instant::now(),
        }
    }

    pub fn with_backdrop(mut self, backdrop: Box<dyn Backdrop>) -> Self {
        self.backdrop = backdrop;
        self
    }

    pub fn with_stars(mut self, stars: watch::Receiver<Option<u64>>) -> Self {
        self.stars = stars;
        self
    }

    pub fn exit_when_done(mut self, exit: bool) -> Self {
        self.exit_when_done = exit;
        self
    }

    /// Starts playback on its own task.
    pub fn spawn(self) -> PlayerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let state = self.published.subscribe();
        let task = tokio::spawn(self.run(stop_rx));
        PlayerHandle {
            stop: stop_tx,
            task,
            state,
        }
    }

    fn draw(&mut self) -> Result<()> {
        let stars = *self.stars.borrow();
        let mut frame = compose(&self.script, &self.state, &self.config.title, stars);
        let (cols, rows) = self.surface.size();
        frame.sprites = self.backdrop.sprites(self.started.elapsed(), cols, rows);
        self.surface.draw(&frame)
    }

    fn schedule(&self, step: Step) -> Option<Instant> {
        match step {
            Step::Typed | Step::Advanced => Some(Instant::now() + self.config.keystroke_delay()),
            Step::Paused => Some(Instant::now() + self.config.pause_delay()),
            Step::Finished | Step::Idle => None,
        }
    }

    async fn run(mut self, mut stop: watch::Receiver<bool>) -> Result<Outcome> {
        self.started = Instant::now();
        self.draw()?;

        let mut deadline = if self.state.is_finished() {
            None
        } else {
            Some(Instant::now() + self.config.keystroke_delay())
        };

        let animate = self.backdrop.animated();
        let mut frames = interval(self.config.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stars_open = true;

        tracing::debug!(entries = self.script.len(), "playback started");

        loop {
            if self.state.is_finished() && self.exit_when_done {
                return Ok(Outcome::Finished);
            }

            let timer = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                // A dropped handle counts as a stop request too
                _ = stop.changed() => {
                    tracing::debug!(phase = ?self.state.phase(), "playback torn down");
                    return Ok(Outcome::Stopped);
                }
                () = timer => {
                    let step = self.state.advance(&self.script);
                    tracing::debug!(
                        ?step,
                        index = self.state.active_index(),
                        typed = self.state.typed_len(),
                        "advanced"
                    );
                    if step == Step::Finished {
                        tracing::info!(entries = self.script.len(), "playback finished");
                    }
                    self.published.send_replace(self.state.clone());
                    self.draw()?;
                    deadline = self.schedule(step);
                }
                changed = self.stars.changed(), if stars_open => {
                    match changed {
                        Ok(()) => self.draw()?,
                        Err(_) => stars_open = false,
                    }
                }
                _ = frames.tick(), if animate => {
                    self.draw()?;
                }
            }
        }
    }
}

pub struct PlayerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<Result<Outcome>>,
    state: watch::Receiver<PlaybackState>,
}

impl PlayerHandle {
    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    /// Resolves when the engine exits on its own. Cancel-safe.
    pub async fn finished(&mut self) -> Result<Outcome> {
        (&mut self.task).await?
    }

    /// Cancels pending timers and waits for the engine to exit.
    pub async fn unmount(mut self) -> Result<Outcome> {
        let _ = self.stop.send(true);
        self.finished().await
    }
}
