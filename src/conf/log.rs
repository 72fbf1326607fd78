//! Verbosity of the room client diagnostics.

use std::{borrow::Cow, str::FromStr as _};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Verbosity of the entries the room client writes about its session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Log {
    /// Name of the least severe [`slog::Level`] still written, or `OFF` to
    /// silence the room client completely.
    /// Defaults to `INFO`.
    #[default("INFO")]
    pub level: Cow<'static, str>,
}

impl Log {
    /// Parses the configured [`slog::Level`].
    ///
    /// `OFF` and names unknown to [`slog`] both mean that nothing is logged.
    pub fn level(&self) -> Option<slog::Level> {
        slog::Level::from_str(&self.level).ok()
    }
}
