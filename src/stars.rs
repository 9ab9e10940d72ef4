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

//! Repository star count
//!
//! Fetched once on a detached thread. Failures are logged and leave the
//! count unset; they never reach the caller.

use serde::Deserialize;
use std::thread;
use tokio::sync::watch;

use crate::error::StarError;

pub const GITHUB_API: &str = "https://api.github.com/repos";
pub const DEFAULT_REPO: &str = "k1lgor/container-diet";

#[derive(Debug, Deserialize)]
struct RepoStats {
    stargazers_count: u64,
}

pub fn parse_star_count(body: &str) -> Result<u64, StarError> {
    let stats: RepoStats = serde_json::from_str(body)?;
    Ok(stats.stargazers_count)
}

pub trait StarSource: Send + 'static {
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<u64, StarError>;
}

pub struct GithubStars {
    url: String,
}

impl GithubStars {
    pub fn new(repo: &str) -> Self {
        Self {
            url: format!("{GITHUB_API}/{}", repo.trim_matches('/')),
        }
    }
}

impl StarSource for GithubStars {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<u64, StarError> {
        let body = ureq::get(&self.url)
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", concat!("dietcast/", env!("CARGO_PKG_VERSION")))
            .call()
            .map_err(Box::new)?
            .into_string()?;
        parse_star_count(&body)
    }
}

/// Starts the fetch and returns a receiver that becomes `Some(count)` on success.
///
/// On failure the sender is dropped with the value still `None`.
pub fn spawn_fetch<S: StarSource>(source: S) -> watch::Receiver<Option<u64>> {
    let (tx, rx) = watch::channel(None);

    thread::spawn(move || match source.fetch() {
        Ok(count) => {
            tracing::info!(count, source = %source.describe(), "fetched star count");
            let _ = tx.send(Some(count));
        }
        Err(e) => {
            tracing::warn!(error = %e, source = %source.describe(), "failed to fetch star count");
        }
    });

    rx
}

/// A receiver that never yields a count, for when the fetch is disabled.
pub fn disabled() -> watch::Receiver<Option<u64>> {
    watch::channel(None).1
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<u64, ()>);

    impl StarSource for Fixed {
        fn describe(&self) -> String {
            "fixed".to_string()
        }

        fn fetch(&self) -> Result<u64, StarError> {
            match self.0 {
                Ok(n) => Ok(n),
                Err(()) => parse_star_count("<html>rate limited</html>"),
            }
        }
    }

    #[test]
    fn test_parse_star_count() {
        let body = r#"{"id": 1, "full_name": "k1lgor/container-diet", "stargazers_count": 42}"#;
        assert_eq!(parse_star_count(body).unwrap(), 42);
    }

    #[test]
    fn test_parse_missing_field() {
        let err = parse_star_count(r#"{"message": "Not Found"}"#).unwrap_err();
        assert!(matches!(err, StarError::Malformed(_)));
    }

    #[test]
    fn test_url() {
        assert_eq!(
            GithubStars::new("k1lgor/container-diet/").describe(),
            "https://api.github.com/repos/k1lgor/container-diet"
        );
    }

    #[tokio::test]
    async fn test_successful_fetch_publishes_count() {
        let mut rx = spawn_fetch(Fixed(Ok(42)));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(42));
    }

    #[tokio::test]
    async fn test_failed_fetch_stays_empty() {
        let mut rx = spawn_fetch(Fixed(Err(())));
        assert!(rx.changed().await.is_err());
        assert_eq!(*rx.borrow(), None);
    }

    #[test]
    fn test_disabled_never_yields() {
        let rx = disabled();
        assert_eq!(*rx.borrow(), None);
        assert!(rx.has_changed().is_err());
    }
}
