use tracing::{debug, info, warn};

use crate::capabilities::{
    Capabilities, FilePart, GalleryPickConfig, HttpError, HttpMethod, HttpRequest, HttpResult,
    MultipartForm, PickedAsset, PickerError, PickerOutput, PickerResult,
};
use crate::error::EditError;
use crate::event::Event;
use crate::model::{Listing, ListingForm, ListingId, Model, SaveStage, SessionId};
use crate::presentation::{self, AlertAction};
use crate::view::{self, ViewModel};
use crate::{UPLOAD_CONTENT_TYPE, UPLOAD_FILE_NAME, UPLOAD_IMAGE_FIELD, UPLOAD_LISTING_FIELD};

#[derive(Default)]
pub struct App;

impl App {
    fn fetch_listing(model: &mut Model, caps: &Capabilities) {
        let (Some(listing_id), Some(session)) = (model.listing_id, model.session.clone()) else {
            return;
        };

        let request = model
            .config
            .api()
            .listing_url(listing_id)
            .map(|url| HttpRequest::new(HttpMethod::Get, url))
            .and_then(|r| r.with_timeout_ms(model.config.request_timeout_ms));

        match request {
            Ok(request) => {
                debug!(%listing_id, request_id = request.request_id(), "fetching listing");
                caps.http.execute(request, move |result| Event::ListingFetched {
                    session,
                    result: Box::new(result),
                });
            }
            Err(e) => {
                model.loading = false;
                Self::report(model, &EditError::read_failed(e));
            }
        }
    }

    fn on_listing_fetched(model: &mut Model, result: HttpResult) {
        // Loading ends on every path.
        model.loading = false;

        let listing = result
            .map_err(EditError::read_failed)
            .and_then(|response| {
                if response.is_success() {
                    response.json::<Listing>().map_err(EditError::read_failed)
                } else {
                    Err(EditError::read_failed(format!("status {}", response.status())))
                }
            });

        match listing {
            Ok(listing) => {
                info!(listing_id = %listing.id, "listing loaded");
                model.form = ListingForm::from_listing(&listing);
                model.current_image_url = listing.current_image_url().map(str::to_string);
            }
            Err(e) => Self::report(model, &e),
        }
    }

    fn launch_picker(model: &Model, session: SessionId, caps: &Capabilities) {
        let config = GalleryPickConfig::single_image().with_quality(model.config.picker_quality);
        caps.image_picker.pick_from_library(config, move |result| Event::ImagePicked {
            session,
            result: Box::new(result),
        });
    }

    fn on_permission_resolved(
        model: &mut Model,
        session: SessionId,
        result: PickerResult,
        caps: &Capabilities,
    ) {
        let error = match result {
            Ok(PickerOutput::PermissionStatus(status)) => {
                model.media_permission = status;
                if status.is_granted() {
                    return Self::launch_picker(model, session, caps);
                }
                info!(?status, "media library access not granted");
                EditError::PermissionDenied { status }
            }
            Ok(other) => EditError::PickerFailed(PickerError::Internal {
                message: format!("unexpected permission response: {other:?}"),
            }),
            Err(e) => e.into(),
        };
        model.picking = false;
        Self::report(model, &error);
    }

    fn on_image_picked(model: &mut Model, result: PickerResult) {
        model.picking = false;
        match result {
            Ok(output) => match output.into_first_asset() {
                Some(asset) => {
                    debug!(uri = %asset.uri, "replacement image selected");
                    model.selected_image = Some(asset);
                }
                // Cancelled or empty: keep whatever was picked before.
                None => debug!("image selection cancelled"),
            },
            Err(e) => Self::report(model, &e.into()),
        }
    }

    fn start_save(model: &mut Model, caps: &Capabilities) {
        if let Err(e) = model.form.validate() {
            debug!(error = %e, "save blocked by validation");
            Self::report(model, &e);
            return;
        }

        let (Some(listing_id), Some(session)) = (model.listing_id, model.session.clone()) else {
            return;
        };

        let request = Self::update_request(model, listing_id);
        match request {
            Ok(request) => {
                model.save_stage = SaveStage::Saving;
                info!(%listing_id, request_id = request.request_id(), "updating listing");
                caps.http.execute(request, move |result| Event::ListingUpdated {
                    session,
                    result: Box::new(result),
                });
            }
            Err(e) => Self::fail_save(model, EditError::Transport(e)),
        }
    }

    fn update_request(model: &Model, listing_id: ListingId) -> Result<HttpRequest, HttpError> {
        let url = model.config.api().listing_url(listing_id)?;
        HttpRequest::new(HttpMethod::Put, url)
            .with_json(&model.form.to_update_request())?
            .with_timeout_ms(model.config.request_timeout_ms)
    }

    fn upload_request(
        model: &Model,
        listing_id: ListingId,
        asset: &PickedAsset,
    ) -> Result<HttpRequest, HttpError> {
        let url = model.config.api().upload_image_url()?;
        let form = MultipartForm::new()
            .text(UPLOAD_LISTING_FIELD, listing_id.to_string())
            .file(
                UPLOAD_IMAGE_FIELD,
                FilePart::new(asset.uri.clone(), UPLOAD_FILE_NAME, UPLOAD_CONTENT_TYPE),
            );

        HttpRequest::new(HttpMethod::Post, url)
            .with_multipart(form)?
            .with_timeout_ms(model.config.upload_timeout_ms)
    }

    fn on_listing_updated(
        model: &mut Model,
        session: SessionId,
        result: HttpResult,
        caps: &Capabilities,
    ) {
        let response = match result {
            Ok(response) => response,
            Err(e) => return Self::fail_save(model, EditError::Transport(e)),
        };
        debug!(
            status = response.status(),
            request_id = response.request_id(),
            duration_ms = response.duration_ms(),
            "listing update answered"
        );

        if !response.is_success() {
            return Self::fail_save(
                model,
                EditError::UpdateRejected {
                    status: response.status(),
                },
            );
        }

        let (Some(listing_id), Some(asset)) = (model.listing_id, model.selected_image.clone())
        else {
            return Self::finish_save(model);
        };

        match Self::upload_request(model, listing_id, &asset) {
            Ok(request) => {
                model.save_stage = SaveStage::UploadingImage;
                info!(%listing_id, request_id = request.request_id(), "uploading image");
                caps.http.execute(request, move |result| Event::ImageUploaded {
                    session,
                    result: Box::new(result),
                });
            }
            Err(e) => Self::fail_save(model, EditError::Transport(e)),
        }
    }

    fn on_image_uploaded(model: &mut Model, result: HttpResult) {
        let outcome = match result {
            Err(e) => Err(EditError::Transport(e)),
            Ok(response) if !response.is_success() => Err(EditError::UploadRejected {
                status: response.status(),
            }),
            Ok(response) => {
                debug!(
                    request_id = response.request_id(),
                    duration_ms = response.duration_ms(),
                    "image uploaded"
                );
                Ok(())
            }
        };

        match outcome {
            Ok(()) => Self::finish_save(model),
            // The listing itself is saved; warn, then carry on to success.
            Err(e) if e.is_soft() => {
                Self::report(model, &e);
                Self::finish_save(model);
            }
            Err(e) => Self::fail_save(model, e),
        }
    }

    fn finish_save(model: &mut Model) {
        model.save_stage = SaveStage::Idle;
        model.selected_image = None;
        info!(listing_id = ?model.listing_id, "listing saved");
        model.push_alert(presentation::save_succeeded(model.config.locale));
    }

    fn fail_save(model: &mut Model, error: EditError) {
        model.save_stage = SaveStage::Idle;
        Self::report(model, &error);
    }

    fn report(model: &mut Model, error: &EditError) {
        match error {
            EditError::MissingFields(_) => {}
            EditError::Transport(e) => {
                warn!(
                    code = error.code(),
                    request_id = ?e.request_id(),
                    error = %e,
                    "edit listing error"
                );
            }
            _ => warn!(code = error.code(), error = %error, "edit listing error"),
        }
        model.push_alert(presentation::alert_for(error, model.config.locale));
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            info!(event = event_name, "user action");
        } else {
            debug!(event = event_name, "update");
        }

        if let Some(session) = event.session() {
            if !model.is_current(session) {
                debug!(event = event_name, %session, "dropping response from stale session");
                return;
            }
        }

        match event {
            Event::Configure(config) => match config.validated() {
                Ok(config) => {
                    info!(base = %config.listings_base, locale = ?config.locale, "configured");
                    model.config = config;
                }
                Err(e) => warn!(error = %e, "rejected configuration"),
            },

            Event::Mount { listing_id } => {
                *model = model.for_mount(listing_id, SessionId::generate());
                Self::fetch_listing(model, caps);
            }

            Event::Unmount => {
                *model = model.unmounted();
                return;
            }

            Event::FieldChanged { field, value } => {
                if model.loading || model.session.is_none() {
                    debug!(?field, "ignoring edit before listing is loaded");
                    return;
                }
                model.form.set(field, value);
            }

            Event::PickImageRequested => {
                let Some(session) = model.session.clone() else {
                    return;
                };
                if model.loading {
                    return;
                }
                if model.picking {
                    debug!("picker already open");
                    return;
                }
                model.picking = true;
                if model.media_permission.is_granted() {
                    Self::launch_picker(model, session, caps);
                } else {
                    caps.image_picker.request_permission(move |result| {
                        Event::MediaPermissionResolved {
                            session,
                            result: Box::new(result),
                        }
                    });
                }
            }

            Event::SaveRequested => {
                if model.loading || model.session.is_none() {
                    return;
                }
                if model.is_saving() {
                    debug!(stage = ?model.save_stage, "save already in progress");
                    return;
                }
                Self::start_save(model, caps);
            }

            Event::AlertAcknowledged => {
                if let Some(alert) = model.alerts.pop_front() {
                    if alert.action == AlertAction::NavigateBack {
                        caps.navigator.back();
                    }
                }
            }

            Event::ListingFetched { result, .. } => {
                if !model.loading {
                    return;
                }
                Self::on_listing_fetched(model, *result);
            }

            Event::MediaPermissionResolved { session, result } => {
                Self::on_permission_resolved(model, session, *result, caps);
            }

            Event::ImagePicked { result, .. } => Self::on_image_picked(model, *result),

            Event::ListingUpdated { session, result } => {
                if model.save_stage != SaveStage::Saving {
                    return;
                }
                Self::on_listing_updated(model, session, *result, caps);
            }

            Event::ImageUploaded { result, .. } => {
                if model.save_stage != SaveStage::UploadingImage {
                    return;
                }
                Self::on_image_uploaded(model, *result);
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{HttpResponse, PermissionStatus};
    use crate::model::EditableField;
    use crate::presentation::AlertKind;

    fn mounted() -> Model {
        let mut model = Model::default().for_mount(ListingId(5), SessionId("s".into()));
        model.loading = false;
        model.form = ListingForm {
            title: "Room".into(),
            city: "LA".into(),
            state: "CA".into(),
            price: "900".into(),
            contact_info: "x@y.z".into(),
            description: String::new(),
        };
        model
    }

    fn response(status: u16, body: &str) -> HttpResult {
        Ok(HttpResponse::new(
            status,
            body.as_bytes().to_vec(),
            "req".into(),
            1,
        ))
    }

    #[test]
    fn fetch_failure_clears_loading_and_alerts() {
        let mut model = Model::default().for_mount(ListingId(5), SessionId("s".into()));
        App::on_listing_fetched(&mut model, response(404, ""));
        assert!(!model.loading);
        assert_eq!(model.form, ListingForm::default());
        assert_eq!(model.alerts.len(), 1);
    }

    #[test]
    fn unparseable_listing_is_a_read_failure() {
        let mut model = Model::default().for_mount(ListingId(5), SessionId("s".into()));
        App::on_listing_fetched(&mut model, response(200, "<html>"));
        assert!(!model.loading);
        assert_eq!(model.alerts[0].kind, AlertKind::Error);
    }

    #[test]
    fn update_request_carries_form_as_json() {
        let mut model = mounted();
        model.form.set(EditableField::Price, "1200.50".into());
        let request = App::update_request(&model, ListingId(5)).unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:8000/api/listings/5/");
        assert_eq!(request.headers().get("content-type"), Some("application/json"));
        let body: serde_json::Value =
            serde_json::from_slice(request.body().as_bytes().unwrap()).unwrap();
        assert_eq!(body["price"], "1200.50");
        assert_eq!(body["title"], "Room");
    }

    #[test]
    fn upload_request_is_multipart_without_content_type() {
        let model = mounted();
        let asset = PickedAsset::new("file:///photo.png");
        let request = App::upload_request(&model, ListingId(5), &asset).unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:8000/api/listings/upload-image/"
        );
        assert!(!request.headers().contains("content-type"));
        let form = request.body().as_multipart().unwrap();
        assert_eq!(form.text_value("listing_id"), Some("5"));
        let file = form.file_part("image").unwrap();
        assert_eq!(file.uri, "file:///photo.png");
        assert_eq!(file.file_name, "listing.jpg");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(request.timeout_ms(), crate::DEFAULT_UPLOAD_TIMEOUT_MS);
    }

    #[test]
    fn upload_rejection_warns_then_succeeds() {
        let mut model = mounted();
        model.save_stage = SaveStage::UploadingImage;
        model.selected_image = Some(PickedAsset::new("file:///a.jpg"));

        App::on_image_uploaded(&mut model, response(500, ""));

        assert_eq!(model.save_stage, SaveStage::Idle);
        let kinds: Vec<_> = model.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Warning, AlertKind::Success]);
        assert_eq!(model.alerts[1].action, AlertAction::NavigateBack);
    }

    #[test]
    fn upload_transport_error_is_not_a_success() {
        let mut model = mounted();
        model.save_stage = SaveStage::UploadingImage;

        App::on_image_uploaded(
            &mut model,
            Err(HttpError::Connection {
                host: "localhost".into(),
                message: "reset".into(),
            }),
        );

        assert!(!model.is_saving());
        assert_eq!(model.alerts.len(), 1);
        assert_eq!(model.alerts[0].action, AlertAction::Dismiss);
    }

    #[test]
    fn cancelled_pick_keeps_previous_selection() {
        let mut model = mounted();
        model.selected_image = Some(PickedAsset::new("file:///old.jpg"));

        App::on_image_picked(&mut model, Ok(PickerOutput::Cancelled));
        assert_eq!(model.selected_image.as_ref().unwrap().uri, "file:///old.jpg");

        App::on_image_picked(&mut model, Ok(PickerOutput::Picked(vec![])));
        assert_eq!(model.selected_image.as_ref().unwrap().uri, "file:///old.jpg");
    }

    #[test]
    fn picker_error_is_reported() {
        let mut model = mounted();
        App::on_image_picked(&mut model, Err(PickerError::Busy));
        assert_eq!(model.alerts.len(), 1);
        assert!(model.selected_image.is_none());
        assert_eq!(model.media_permission, PermissionStatus::NotDetermined);
    }

    #[test]
    fn finished_pick_reopens_the_picker() {
        let mut model = mounted();
        model.picking = true;
        App::on_image_picked(&mut model, Err(PickerError::Busy));
        assert!(!model.picking);
    }
}
