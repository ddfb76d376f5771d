//! Moving the learner to the login page.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::info;

/// The host's notion of "where the learner is".
pub trait Navigator: Send + Sync + fmt::Debug {
    /// Path of the current page, e.g. `/dashboard`.
    fn current_path(&self) -> String;

    /// Navigates to `path`.
    fn redirect(&self, path: &str);
}

/// Returns `true` if `current` is the login page.
///
/// Query strings, fragments and a trailing slash are ignored.
#[must_use]
pub fn is_login_path(current: &str, login_path: &str) -> bool {
    let path = current.split(['?', '#']).next().unwrap_or_default();
    let normalize = |p: &str| p.trim_end_matches('/').to_string();
    normalize(path) == normalize(login_path)
}

/// Redirects to `login_path` unless already there.
///
/// Returns `true` if a redirect was issued. Concurrent callers may race; the
/// losers observe the login path and do nothing.
pub fn redirect_to_login(navigator: &dyn Navigator, login_path: &str) -> bool {
    if is_login_path(&navigator.current_path(), login_path) {
        return false;
    }
    navigator.redirect(login_path);
    true
}

/// [`Navigator`] for headless hosts: remembers the path and logs redirects.
#[derive(Debug)]
pub struct LoggingNavigator {
    path: Mutex<String>,
}

impl LoggingNavigator {
    /// Starts at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
        }
    }
}

impl Default for LoggingNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for LoggingNavigator {
    fn current_path(&self) -> String {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect(&self, path: &str) {
        let mut current = self.path.lock().unwrap_or_else(PoisonError::into_inner);
        info!(from = %current, to = path, "Redirecting");
        *current = path.to_string();
    }
}
