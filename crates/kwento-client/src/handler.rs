//! Caller-side error handling: toasts, callbacks and the login redirect.
//!
//! Pages wrap calls in [`ErrorHandler::handle`]. A failure is reported to the
//! learner through a [`Notifier`] with a [`friendly_message`], passed to an
//! optional callback, and (for an expired session) turned into a redirect
//! to the login page. The redirect replaces the toast unless the caller
//! suppressed it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify;
use crate::client::RequestOptions;
use crate::error::{AppError, ClientError, ErrorType};
use crate::navigator::{self, Navigator};

/// Shows a short message to the learner.
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Displays `message` as an error toast.
    fn notify(&self, message: &str);
}

/// [`Notifier`] that writes toasts to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(message, "Toast");
    }
}

/// Callback invoked with every classified failure.
pub type ErrorCallback = Box<dyn Fn(&AppError) + Send + Sync>;

/// Per-call handling options.
pub struct HandleOptions {
    /// Show a toast for the failure.
    pub notify: bool,
    /// Keep the learner on the current page even if the session expired.
    pub suppress_redirect: bool,
    /// Called with the classified error after the toast.
    pub on_error: Option<ErrorCallback>,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            notify: true,
            suppress_redirect: false,
            on_error: None,
        }
    }
}

impl fmt::Debug for HandleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleOptions")
            .field("notify", &self.notify)
            .field("suppress_redirect", &self.suppress_redirect)
            .field("on_error", &self.on_error.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl HandleOptions {
    /// Options that neither toast nor redirect.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            notify: false,
            suppress_redirect: true,
            on_error: None,
        }
    }

    /// Client options that carry `suppress_redirect` into the call itself.
    #[must_use]
    pub const fn request_options(&self) -> RequestOptions {
        RequestOptions {
            suppress_redirect: self.suppress_redirect,
        }
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&AppError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }
}

/// The text shown to the learner for `error`.
///
/// Connectivity-type failures get generic text; everything else shows the
/// error's message, which is the server's own wording when it sent one.
#[must_use]
pub fn friendly_message(error: &AppError) -> String {
    match error.kind() {
        ErrorType::Network | ErrorType::Timeout | ErrorType::Server => {
            error.kind().default_message().to_string()
        }
        ErrorType::Validation
        | ErrorType::Authentication
        | ErrorType::Authorization
        | ErrorType::NotFound
        | ErrorType::Unknown => error.message().to_string(),
    }
}

/// What [`ErrorHandler::report`] did with a failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Handled {
    /// The toast text, if one was shown.
    pub toast: Option<String>,
    /// Whether the learner was sent to the login page.
    pub redirected: bool,
}

/// Reports failures to the learner.
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl ErrorHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            navigator,
            login_path: login_path.into(),
        }
    }

    /// Awaits `operation`, reporting any failure before returning it.
    ///
    /// Cancellation is returned without a toast or callback.
    pub async fn handle<T, F>(
        &self,
        operation: F,
        options: &HandleOptions,
    ) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match operation.await {
            Ok(value) => Ok(value),
            Err(ClientError::Cancelled) => {
                debug!("Operation cancelled; nothing to report");
                Err(ClientError::Cancelled)
            }
            Err(ClientError::App(error)) => {
                self.report(&error, options);
                Err(ClientError::App(error))
            }
        }
    }

    /// Reports one classified failure.
    pub fn report(&self, error: &AppError, options: &HandleOptions) -> Handled {
        let mut handled = Handled::default();

        let redirecting = classify::is_session_expiry(error) && !options.suppress_redirect;
        if redirecting {
            handled.redirected =
                navigator::redirect_to_login(self.navigator.as_ref(), &self.login_path);
        }

        // The login page tells the learner what happened.
        if options.notify && !redirecting {
            let message = friendly_message(error);
            self.notifier.notify(&message);
            handled.toast = Some(message);
        }

        if let Some(callback) = &options.on_error {
            callback(error);
        }

        debug!(
            kind = %error.kind(),
            toast = handled.toast.is_some(),
            redirected = handled.redirected,
            "Error handled"
        );
        handled
    }
}
