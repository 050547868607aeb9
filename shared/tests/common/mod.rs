#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use listings_shared::capabilities::{
    HttpOperation, HttpResponse, HttpResult, NavigationOperation, PermissionStatus, PickedAsset,
    PickerOperation, PickerOutput,
};
use listings_shared::{App, Effect, Event, ListingId, Model};

pub const LISTING_ID: ListingId = ListingId(42);

pub const LISTING_JSON: &str = r#"{
    "id": 42,
    "title": "Sunny room near campus",
    "city": "Los Angeles",
    "state": "California",
    "price": "1500.00",
    "description": null,
    "contact_info": "555-0100",
    "created_at": "2025-03-01T12:00:00Z",
    "images": [
        {"id": 9, "image": "listings/9.jpg", "image_url": "http://localhost:8000/media/listings/9.jpg", "uploaded_at": "2025-03-01T12:00:00Z"}
    ],
    "posted_days_ago": 2
}"#;

pub type Tester = AppTester<App, Effect>;

/// Effects of one user action, split by capability.
#[derive(Default)]
pub struct Effects {
    pub renders: usize,
    pub http: Vec<Request<HttpOperation>>,
    pub picker: Vec<Request<PickerOperation>>,
    pub navigation: Vec<Request<NavigationOperation>>,
}

impl Effects {
    fn absorb(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(_) => self.renders += 1,
                Effect::Http(request) => self.http.push(request),
                Effect::ImagePicker(request) => self.picker.push(request),
                Effect::Navigator(request) => self.navigation.push(request),
            }
        }
    }
}

pub fn response(status: u16, body: &str) -> HttpResult {
    Ok(HttpResponse::new(
        status,
        body.as_bytes().to_vec(),
        "test-request".to_string(),
        5,
    ))
}

/// Applies an update's effects and runs every event it produced to quiescence.
pub fn settle(app: &Tester, model: &mut Model, update: Update<Effect, Event>) -> Effects {
    let mut effects = Effects::default();
    effects.absorb(update.effects);
    for event in update.events {
        let next = app.update(event, model);
        let nested = settle(app, model, next);
        effects.renders += nested.renders;
        effects.http.extend(nested.http);
        effects.picker.extend(nested.picker);
        effects.navigation.extend(nested.navigation);
    }
    effects
}

pub fn send(app: &Tester, model: &mut Model, event: Event) -> Effects {
    let update = app.update(event, model);
    settle(app, model, update)
}

pub fn resolve_http(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<HttpOperation>,
    result: HttpResult,
) -> Effects {
    let update = app.resolve(request, result).expect("http request resolves");
    settle(app, model, update)
}

pub fn resolve_picker(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<PickerOperation>,
    output: PickerOutput,
) -> Effects {
    let update = app.resolve(request, Ok(output)).expect("picker request resolves");
    settle(app, model, update)
}

/// Mounts the screen and answers the read with `LISTING_JSON`.
pub fn loaded_screen() -> (Tester, Model) {
    let app = Tester::default();
    let mut model = Model::default();

    let mut effects = send(&app, &mut model, Event::Mount {
        listing_id: LISTING_ID,
    });
    let mut fetch = effects.http.remove(0);
    resolve_http(&app, &mut model, &mut fetch, response(200, LISTING_JSON));
    assert!(!model.loading);

    (app, model)
}

/// Drives the permission prompt and picker to select `uri`.
pub fn pick_image(app: &Tester, model: &mut Model, uri: &str) {
    let mut effects = send(app, model, Event::PickImageRequested);
    let mut request = effects.picker.remove(0);

    if matches!(request.operation, PickerOperation::RequestMediaLibraryPermission) {
        effects = resolve_picker(
            app,
            model,
            &mut request,
            PickerOutput::PermissionStatus(PermissionStatus::Granted),
        );
        request = effects.picker.remove(0);
    }

    assert!(matches!(
        request.operation,
        PickerOperation::LaunchImageLibrary { .. }
    ));
    resolve_picker(
        app,
        model,
        &mut request,
        PickerOutput::Picked(vec![PickedAsset::new(uri)]),
    );
}
