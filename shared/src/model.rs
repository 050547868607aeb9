use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::VecDeque, fmt};

use crate::capabilities::{PermissionStatus, PickedAsset};
use crate::config::EditorConfig;
use crate::error::EditError;
use crate::presentation::Alert;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one mount of the screen. Responses tagged with an older
/// session are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    Title,
    City,
    State,
    Price,
    Contact,
    Description,
}

impl EditableField {
    pub const ALL: [Self; 6] = [
        Self::Title,
        Self::City,
        Self::State,
        Self::Price,
        Self::Contact,
        Self::Description,
    ];

    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::Description)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingImage {
    pub id: u64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

/// Listing as the server returns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub city: String,
    pub state: String,
    #[serde(deserialize_with = "price_as_text")]
    pub price: String,
    #[serde(default)]
    pub description: Option<String>,
    pub contact_info: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub images: Vec<ListingImage>,
    #[serde(default)]
    pub posted_days_ago: Option<i64>,
}

impl Listing {
    /// URL of the most recently uploaded image.
    pub fn current_image_url(&self) -> Option<&str> {
        self.images
            .iter()
            .rev()
            .find_map(|img| img.image_url.as_deref().or(img.image.as_deref()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Text(String),
    Number(serde_json::Number),
}

// Decimal prices come back as "1500.00" or 1500 depending on server settings.
fn price_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PriceRepr::deserialize(deserializer)? {
        PriceRepr::Text(s) => s,
        PriceRepr::Number(n) => match n.as_f64() {
            // 1500.0 and 1e3 read as "1500" and "1000", not "1500.0".
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        },
    })
}

/// PUT body. `price` is forwarded exactly as typed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateListingRequest {
    pub title: String,
    pub city: String,
    pub state: String,
    pub price: String,
    pub contact_info: String,
    pub description: String,
}

/// Local editable copy of the listing fields.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingForm {
    pub title: String,
    pub city: String,
    pub state: String,
    pub price: String,
    pub contact_info: String,
    pub description: String,
}

// Contact details are personal data; keep them out of logs.
impl fmt::Debug for ListingForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingForm")
            .field("title", &self.title)
            .field("city", &self.city)
            .field("state", &self.state)
            .field("price", &self.price)
            .field("contact_info_present", &!self.contact_info.is_empty())
            .field("description_len", &self.description.len())
            .finish()
    }
}

impl ListingForm {
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            city: listing.city.clone(),
            state: listing.state.clone(),
            price: listing.price.clone(),
            contact_info: listing.contact_info.clone(),
            description: listing.description.clone().unwrap_or_default(),
        }
    }

    pub fn get(&self, field: EditableField) -> &str {
        match field {
            EditableField::Title => &self.title,
            EditableField::City => &self.city,
            EditableField::State => &self.state,
            EditableField::Price => &self.price,
            EditableField::Contact => &self.contact_info,
            EditableField::Description => &self.description,
        }
    }

    pub fn set(&mut self, field: EditableField, value: String) {
        let slot = match field {
            EditableField::Title => &mut self.title,
            EditableField::City => &mut self.city,
            EditableField::State => &mut self.state,
            EditableField::Price => &mut self.price,
            EditableField::Contact => &mut self.contact_info,
            EditableField::Description => &mut self.description,
        };
        *slot = value;
    }

    /// Required fields that are empty or whitespace-only, in form order.
    pub fn missing_required(&self) -> Vec<EditableField> {
        EditableField::ALL
            .into_iter()
            .filter(|field| field.is_required() && self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), EditError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EditError::MissingFields(missing))
        }
    }

    pub fn to_update_request(&self) -> UpdateListingRequest {
        UpdateListingRequest {
            title: self.title.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            price: self.price.clone(),
            contact_info: self.contact_info.clone(),
            description: self.description.clone(),
        }
    }
}

/// Where `save` currently is. Anything but `Idle` means the save control is
/// disabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStage {
    #[default]
    Idle,
    Saving,
    UploadingImage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub config: EditorConfig,
    pub session: Option<SessionId>,
    pub listing_id: Option<ListingId>,

    pub form: ListingForm,
    pub current_image_url: Option<String>,
    /// Freshly picked replacement; `None` keeps the server's image.
    pub selected_image: Option<PickedAsset>,

    pub loading: bool,
    pub save_stage: SaveStage,
    /// A permission prompt or the library picker is on screen.
    pub picking: bool,
    pub media_permission: PermissionStatus,

    pub alerts: VecDeque<Alert>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            config: EditorConfig::default(),
            session: None,
            listing_id: None,
            form: ListingForm::default(),
            current_image_url: None,
            selected_image: None,
            loading: true,
            save_stage: SaveStage::Idle,
            picking: false,
            media_permission: PermissionStatus::default(),
            alerts: VecDeque::new(),
        }
    }
}

impl Model {
    /// Fresh state for a new mount, keeping what outlives one screen:
    /// configuration and an already granted library permission.
    pub fn for_mount(&self, listing_id: ListingId, session: SessionId) -> Self {
        Self {
            session: Some(session),
            listing_id: Some(listing_id),
            ..self.unmounted()
        }
    }

    /// State after the screen goes away. Without a session every pending
    /// response is stale.
    pub fn unmounted(&self) -> Self {
        Self {
            config: self.config.clone(),
            media_permission: self.media_permission,
            ..Self::default()
        }
    }

    pub fn is_saving(&self) -> bool {
        self.save_stage != SaveStage::Idle
    }

    pub fn is_current(&self, session: &SessionId) -> bool {
        self.session.as_ref() == Some(session)
    }

    pub fn push_alert(&mut self, alert: Alert) {
        self.alerts.push_back(alert);
    }
}
