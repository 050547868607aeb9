use serde::{Deserialize, Serialize};

use crate::model::{EditableField, Model};
use crate::presentation::{self, Alert, AlertAction, AlertKind};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardKind {
    Text,
    Numeric,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldView {
    pub field: EditableField,
    pub label: String,
    pub placeholder: String,
    pub value: String,
    pub required: bool,
    pub multiline: bool,
    pub keyboard: KeyboardKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormView {
    pub heading: String,
    pub fields: Vec<FieldView>,
    pub image_button_label: String,
    /// Local URI of the freshly picked replacement, for preview.
    pub selected_image_uri: Option<String>,
    pub current_image_url: Option<String>,
    pub save_label: String,
    /// Drives the spinner inside the save button.
    pub saving: bool,
    pub save_enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScreenView {
    Loading,
    Form(FormView),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertView {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub button: String,
    pub navigates_back: bool,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        Self {
            kind: alert.kind,
            title: alert.title.clone(),
            message: alert.message.clone(),
            button: alert.button.clone(),
            navigates_back: alert.action == AlertAction::NavigateBack,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub screen: ScreenView,
    /// Front of the alert queue; the shell shows one at a time.
    pub alert: Option<AlertView>,
    pub right_to_left: bool,
}

impl ViewModel {
    pub fn form(&self) -> Option<&FormView> {
        match &self.screen {
            ScreenView::Form(form) => Some(form),
            ScreenView::Loading => None,
        }
    }
}

pub(crate) fn build(model: &Model) -> ViewModel {
    let locale = model.config.locale;

    let screen = if model.loading {
        ScreenView::Loading
    } else {
        let fields = EditableField::ALL
            .into_iter()
            .map(|field| FieldView {
                field,
                label: presentation::field_label(field, locale),
                placeholder: presentation::field_placeholder(field, locale),
                value: model.form.get(field).to_string(),
                required: field.is_required(),
                multiline: field == EditableField::Description,
                keyboard: if field == EditableField::Price {
                    KeyboardKind::Numeric
                } else {
                    KeyboardKind::Text
                },
            })
            .collect();

        let saving = model.is_saving();
        ScreenView::Form(FormView {
            heading: presentation::heading(locale),
            fields,
            image_button_label: presentation::image_button_label(
                model.selected_image.is_some(),
                locale,
            ),
            selected_image_uri: model.selected_image.as_ref().map(|a| a.uri.clone()),
            current_image_url: model.current_image_url.clone(),
            save_label: presentation::save_label(locale),
            saving,
            save_enabled: !saving,
        })
    };

    ViewModel {
        screen,
        alert: model.alerts.front().map(AlertView::from),
        right_to_left: locale.is_rtl(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::PickedAsset;
    use crate::model::SaveStage;

    fn loaded_model() -> Model {
        let mut model = Model {
            loading: false,
            ..Model::default()
        };
        model.form.set(EditableField::Price, "1500".into());
        model
    }

    #[test]
    fn loading_shows_spinner_only() {
        let view = build(&Model::default());
        assert_eq!(view.screen, ScreenView::Loading);
        assert!(view.form().is_none());
    }

    #[test]
    fn form_lists_fields_in_order() {
        let view = build(&loaded_model());
        let form = view.form().unwrap();
        let fields: Vec<_> = form.fields.iter().map(|f| f.field).collect();
        assert_eq!(fields, EditableField::ALL.to_vec());

        let price = &form.fields[3];
        assert_eq!(price.value, "1500");
        assert_eq!(price.keyboard, KeyboardKind::Numeric);
        assert!(form.fields[5].multiline);
        assert!(!form.fields[5].required);
    }

    #[test]
    fn save_disabled_while_saving() {
        let mut model = loaded_model();
        model.save_stage = SaveStage::UploadingImage;
        let view = build(&model);
        let form = view.form().unwrap();
        assert!(form.saving);
        assert!(!form.save_enabled);
    }

    #[test]
    fn selected_image_changes_button_and_preview() {
        let mut model = loaded_model();
        model.selected_image = Some(PickedAsset::new("file:///new.jpg"));
        let view = build(&model);
        let form = view.form().unwrap();
        assert_eq!(form.image_button_label, "Change image (optional)");
        assert_eq!(form.selected_image_uri.as_deref(), Some("file:///new.jpg"));
    }

    #[test]
    fn only_front_alert_is_shown() {
        let mut model = loaded_model();
        let locale = model.config.locale;
        model.push_alert(presentation::alert_for(
            &crate::error::EditError::UploadRejected { status: 500 },
            locale,
        ));
        model.push_alert(presentation::save_succeeded(locale));

        let alert = build(&model).alert.unwrap();
        assert_eq!(alert.kind, AlertKind::Warning);
        assert!(!alert.navigates_back);
    }
}
