mod http;
mod navigation;
mod picker;

pub use self::http::{
    FilePart, FormPart, Http, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest,
    HttpResponse, HttpResult, MultipartForm, RequestBody, ValidatedUrl, MAX_TIMEOUT_MS,
};
pub use self::navigation::{NavigationOperation, Navigator};
pub use self::picker::{
    GalleryPickConfig, ImagePicker, PermissionStatus, PickedAsset, PickerError,
    PickerOperation, PickerOutput, PickerResult, DEFAULT_PICKER_QUALITY,
};

// Crux's built-in Render capability covers view updates as-is.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub image_picker: ImagePicker<Event>,
    pub navigator: Navigator<Event>,
}
