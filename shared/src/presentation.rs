//! User-facing text. Business logic hands over an [`EditError`] and gets back
//! a ready-to-show [`Alert`]; no other module builds strings for the user.
//!
//! Strings live in Fluent resources under `assets/i18n/`, compiled in and
//! parsed once per process.

use std::sync::LazyLock;

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::FluentResource;
use serde::{Deserialize, Serialize};
use tracing::warn;
use unic_langid::{langid, LanguageIdentifier};

use crate::error::EditError;
use crate::model::EditableField;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fa")]
    Persian,
}

impl Locale {
    pub fn is_rtl(self) -> bool {
        matches!(self, Self::Persian)
    }

    pub fn language_id(self) -> LanguageIdentifier {
        match self {
            Self::English => langid!("en"),
            Self::Persian => langid!("fa"),
        }
    }

    fn resource(self) -> &'static str {
        match self {
            Self::English => include_str!("../assets/i18n/en.ftl"),
            Self::Persian => include_str!("../assets/i18n/fa.ftl"),
        }
    }

    fn bundle(self) -> &'static Bundle {
        let (english, persian) = &*BUNDLES;
        match self {
            Self::English => english,
            Self::Persian => persian,
        }
    }
}

type Bundle = FluentBundle<FluentResource>;

static BUNDLES: LazyLock<(Bundle, Bundle)> =
    LazyLock::new(|| (load_bundle(Locale::English), load_bundle(Locale::Persian)));

// A broken entry only loses that entry; the rest of the file still loads.
fn load_bundle(locale: Locale) -> Bundle {
    let lang = locale.language_id();
    let resource = FluentResource::try_new(locale.resource().to_string()).unwrap_or_else(
        |(partial, errors)| {
            warn!(%lang, ?errors, "translation resource has syntax errors");
            partial
        },
    );

    let mut bundle = Bundle::new_concurrent(vec![lang.clone()]);
    // Shells lay out bidi text themselves; isolation marks would leak into labels.
    bundle.set_use_isolating(false);
    if let Err(errors) = bundle.add_resource(resource) {
        warn!(%lang, ?errors, "duplicate translation ids");
    }
    bundle
}

/// Resolves a message id. Unknown ids come back verbatim so a gap shows up
/// on screen instead of an empty label.
pub fn tr(locale: Locale, id: &str) -> String {
    let bundle = locale.bundle();
    let Some(pattern) = bundle.get_message(id).and_then(|message| message.value()) else {
        warn!(lang = %locale.language_id(), id, "missing translation");
        return id.to_string();
    };

    let mut errors = Vec::new();
    let text = bundle.format_pattern(pattern, None, &mut errors);
    if !errors.is_empty() {
        warn!(lang = %locale.language_id(), id, ?errors, "translation failed to format");
    }
    text.into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Error,
    Warning,
    Success,
    PermissionRequired,
}

impl AlertKind {
    fn title_id(self) -> &'static str {
        match self {
            Self::Error => "alert-title-error",
            Self::Warning => "alert-title-warning",
            Self::Success => "alert-title-success",
            Self::PermissionRequired => "alert-title-permission",
        }
    }
}

/// What acknowledging the alert does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    #[default]
    Dismiss,
    NavigateBack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub button: String,
    pub action: AlertAction,
}

impl Alert {
    fn new(kind: AlertKind, message_id: &str, locale: Locale) -> Self {
        Self {
            kind,
            title: tr(locale, kind.title_id()),
            message: tr(locale, message_id),
            button: tr(locale, "alert-ok"),
            action: AlertAction::Dismiss,
        }
    }

    #[must_use]
    fn then(mut self, action: AlertAction) -> Self {
        self.action = action;
        self
    }
}

pub fn alert_for(err: &EditError, locale: Locale) -> Alert {
    let (kind, message_id) = match err {
        EditError::MissingFields(_) => (AlertKind::Error, "error-missing-fields"),
        EditError::ReadFailed { .. } => (AlertKind::Error, "error-read-failed"),
        EditError::UpdateRejected { .. } => (AlertKind::Error, "error-update-failed"),
        EditError::UploadRejected { .. } => (AlertKind::Warning, "warning-upload-failed"),
        EditError::Transport(_) => (AlertKind::Error, "error-connection"),
        EditError::PermissionDenied { .. } => {
            (AlertKind::PermissionRequired, "error-permission-required")
        }
        EditError::PickerFailed(_) => (AlertKind::Error, "error-picker-failed"),
    };
    Alert::new(kind, message_id, locale)
}

/// Final alert of a completed save; acknowledging it leaves the screen.
pub fn save_succeeded(locale: Locale) -> Alert {
    Alert::new(AlertKind::Success, "success-saved", locale).then(AlertAction::NavigateBack)
}

fn field_stem(field: EditableField) -> &'static str {
    match field {
        EditableField::Title => "title",
        EditableField::City => "city",
        EditableField::State => "state",
        EditableField::Price => "price",
        EditableField::Contact => "contact",
        EditableField::Description => "description",
    }
}

pub fn field_label(field: EditableField, locale: Locale) -> String {
    tr(locale, &format!("field-{}-label", field_stem(field)))
}

pub fn field_placeholder(field: EditableField, locale: Locale) -> String {
    tr(locale, &format!("field-{}-placeholder", field_stem(field)))
}

pub fn heading(locale: Locale) -> String {
    tr(locale, "form-heading")
}

pub fn image_button_label(has_selection: bool, locale: Locale) -> String {
    tr(locale, if has_selection { "image-change" } else { "image-select" })
}

pub fn save_label(locale: Locale) -> String {
    tr(locale, "save-changes")
}
