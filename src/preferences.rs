//! Persisted user choices.

/// Storage of the user choices surviving page reloads and rejoins.
#[cfg_attr(any(test, feature = "mockable"), mockall::automock)]
pub trait Preferences {
    /// Returns whether the webcam was left enabled, if it was ever toggled.
    fn webcam_enabled(&self) -> Option<bool>;

    /// Remembers whether the webcam is enabled.
    fn set_webcam_enabled(&self, enabled: bool);

    /// Remembers display name of the local peer.
    fn set_display_name(&self, name: &str);
}
