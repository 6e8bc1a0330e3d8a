//! User-facing state of an audio check.
//!
//! A [`StatusView`] is what a front end shows for the currently selected
//! video: whether it has audio, and the message line below it.

use crate::error::DetectionError;
use serde::Serialize;

/// Shown when a check completes and the video has no audio.
pub const NO_AUDIO_MESSAGE: &str = "The selected video contains no audio.";

/// Prefix of the message shown when a check fails.
pub const CHECK_FAILED_PREFIX: &str = "An error occurred while checking the video";

/// Audio state of the selected video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Nothing selected, a check pending, or a check that failed
    #[default]
    Idle,
    WithAudio,
    WithoutAudio,
}

/// Presentation state for one selected video.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatusView {
    pub state: CheckState,
    pub selected_file: Option<String>,
    pub error: Option<String>,
}

impl StatusView {
    /// State right after a file is selected, before its check completes.
    pub fn selected(name: impl Into<String>) -> Self {
        Self {
            state: CheckState::Idle,
            selected_file: Some(name.into()),
            error: None,
        }
    }

    /// Applies the outcome of a check to this view.
    ///
    /// A failure leaves the state at `Idle`: no verdict is assumed.
    pub fn apply(&mut self, result: &Result<bool, DetectionError>) {
        match result {
            Ok(true) => {
                self.state = CheckState::WithAudio;
                self.error = None;
            }
            Ok(false) => {
                self.state = CheckState::WithoutAudio;
                self.error = Some(NO_AUDIO_MESSAGE.to_string());
            }
            Err(e) => {
                self.state = CheckState::Idle;
                self.error = Some(format!("{CHECK_FAILED_PREFIX}: {e}"));
            }
        }
    }

    /// View for `name` after its check finished with `result`.
    pub fn from_result(name: impl Into<String>, result: &Result<bool, DetectionError>) -> Self {
        let mut view = Self::selected(name);
        view.apply(result);
        view
    }

    pub fn has_audio(&self) -> Option<bool> {
        match self.state {
            CheckState::WithAudio => Some(true),
            CheckState::WithoutAudio => Some(false),
            CheckState::Idle => None,
        }
    }
}
