use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, PickerResult};
use crate::config::EditorConfig;
use crate::model::{EditableField, ListingId, SessionId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Configure(EditorConfig),

    /// The route resolved to a listing; starts a fresh session and the read.
    Mount {
        listing_id: ListingId,
    },
    Unmount,

    FieldChanged {
        field: EditableField,
        value: String,
    },
    PickImageRequested,
    SaveRequested,
    AlertAcknowledged,

    // Capability responses. Not sent by the shell directly.
    #[serde(skip)]
    ListingFetched {
        session: SessionId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    MediaPermissionResolved {
        session: SessionId,
        result: Box<PickerResult>,
    },
    #[serde(skip)]
    ImagePicked {
        session: SessionId,
        result: Box<PickerResult>,
    },
    #[serde(skip)]
    ListingUpdated {
        session: SessionId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    ImageUploaded {
        session: SessionId,
        result: Box<HttpResult>,
    },
}

impl Event {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::Mount { .. } => "mount",
            Self::Unmount => "unmount",
            Self::FieldChanged { .. } => "field_changed",
            Self::PickImageRequested => "pick_image_requested",
            Self::SaveRequested => "save_requested",
            Self::AlertAcknowledged => "alert_acknowledged",
            Self::ListingFetched { .. } => "listing_fetched",
            Self::MediaPermissionResolved { .. } => "media_permission_resolved",
            Self::ImagePicked { .. } => "image_picked",
            Self::ListingUpdated { .. } => "listing_updated",
            Self::ImageUploaded { .. } => "image_uploaded",
        }
    }

    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::FieldChanged { .. }
                | Self::PickImageRequested
                | Self::SaveRequested
                | Self::AlertAcknowledged
        )
    }

    /// Session a capability response belongs to.
    pub fn session(&self) -> Option<&SessionId> {
        match self {
            Self::ListingFetched { session, .. }
            | Self::MediaPermissionResolved { session, .. }
            | Self::ImagePicked { session, .. }
            | Self::ListingUpdated { session, .. }
            | Self::ImageUploaded { session, .. } => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_events_deserialize() {
        let event: Event = serde_json::from_str(r#"{"Mount":{"listing_id":12}}"#).unwrap();
        assert_eq!(
            event,
            Event::Mount {
                listing_id: ListingId(12)
            }
        );

        let event: Event =
            serde_json::from_str(r#"{"FieldChanged":{"field":"contact","value":"x"}}"#).unwrap();
        assert!(event.is_user_initiated());
        assert_eq!(event.name(), "field_changed");
    }

    #[test]
    fn responses_carry_session() {
        let session = SessionId("s-1".into());
        let event = Event::ImagePicked {
            session: session.clone(),
            result: Box::new(Ok(crate::capabilities::PickerOutput::Cancelled)),
        };
        assert_eq!(event.session(), Some(&session));
        assert!(Event::SaveRequested.session().is_none());
    }
}
