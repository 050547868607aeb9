use thiserror::Error;

use crate::capabilities::{HttpError, PermissionStatus, PickerError};
use crate::model::EditableField;

/// Outcome of a failed step on the edit screen. Mapped to an alert by
/// [`crate::presentation::alert_for`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("required fields are empty: {0:?}")]
    MissingFields(Vec<EditableField>),

    #[error("failed to read listing: {reason}")]
    ReadFailed { reason: String },

    #[error("listing update rejected with status {status}")]
    UpdateRejected { status: u16 },

    #[error("image upload rejected with status {status}")]
    UploadRejected { status: u16 },

    #[error("transport failure: {0}")]
    Transport(#[source] HttpError),

    #[error("media library access not granted ({status:?})")]
    PermissionDenied { status: PermissionStatus },

    #[error("image picker failed: {0}")]
    PickerFailed(#[source] PickerError),
}

impl EditError {
    /// Stable identifier for log fields.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::ReadFailed { .. } => "READ_FAILED",
            Self::UpdateRejected { .. } => "UPDATE_REJECTED",
            Self::UploadRejected { .. } => "UPLOAD_REJECTED",
            Self::Transport(_) => "TRANSPORT",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::PickerFailed(_) => "PICKER_FAILED",
        }
    }

    /// Whether the save still counts as successful.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::UploadRejected { .. })
    }

    pub fn read_failed(reason: impl ToString) -> Self {
        Self::ReadFailed {
            reason: reason.to_string(),
        }
    }
}

impl From<HttpError> for EditError {
    fn from(err: HttpError) -> Self {
        Self::Transport(err)
    }
}

impl From<PickerError> for EditError {
    fn from(err: PickerError) -> Self {
        Self::PickerFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_upload_rejection_is_soft() {
        assert!(EditError::UploadRejected { status: 500 }.is_soft());
        assert!(!EditError::UpdateRejected { status: 500 }.is_soft());
        assert!(!EditError::Transport(HttpError::Cancelled {
            request_id: "r".into()
        })
        .is_soft());
    }

    #[test]
    fn http_errors_convert_to_transport() {
        let err: EditError = HttpError::Timeout {
            timeout_ms: 10,
            request_id: "r".into(),
        }
        .into();
        assert_eq!(err.code(), "TRANSPORT");
        assert!(err.to_string().contains("timeout after 10ms"));
    }
}
