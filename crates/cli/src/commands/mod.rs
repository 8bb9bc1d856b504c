//! Command implementations.
//!
//! Each submodule drives one area of the storefront session and prints the
//! result through [`Output`], as text or as JSON.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

use std::path::PathBuf;

use ryj_storefront::admin::AdminError;
use ryj_storefront::auth::AuthError;
use ryj_storefront::{StorefrontError, StorefrontSession};
use serde::Serialize;
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// A local input file could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CliError {
    /// Whether the error should be reported to Sentry.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Storefront(e) => e.is_internal(),
            Self::Read { .. } => false,
        }
    }
}

impl From<AdminError> for CliError {
    fn from(e: AdminError) -> Self {
        Self::Storefront(e.into())
    }
}

impl From<AuthError> for CliError {
    fn from(e: AuthError) -> Self {
        Self::Storefront(e.into())
    }
}

/// Where command results go.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print one line of text. Suppressed in JSON mode.
    pub fn line(&self, text: impl std::fmt::Display) {
        if !self.json {
            #[allow(clippy::print_stdout)]
            {
                println!("{text}");
            }
        }
    }

    /// Print `value` as JSON in JSON mode, otherwise run `text`.
    pub fn render<T, F>(&self, value: &T, text: F)
    where
        T: Serialize + ?Sized,
        F: FnOnce(&Self),
    {
        if self.json {
            match serde_json::to_string_pretty(value) {
                #[allow(clippy::print_stdout)]
                Ok(body) => println!("{body}"),
                Err(e) => tracing::error!(error = %e, "Failed to serialize output"),
            }
        } else {
            text(self);
        }
    }
}

/// Attach the logged-in user, if any, to Sentry events.
pub fn set_sentry_user(session: &StorefrontSession) {
    let user = session.auth().user().map(|user| sentry::User {
        id: Some(user.id.to_string()),
        email: Some(user.email.clone()),
        ..Default::default()
    });
    sentry::configure_scope(|scope| scope.set_user(user));
}

/// Record a user action for Sentry error reports.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };
    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }
    sentry::add_breadcrumb(breadcrumb);
}
