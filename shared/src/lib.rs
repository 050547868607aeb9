// lib.rs - Edit Listing screen core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod presentation;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{ConfigError, EditorConfig};
pub use crux_core::{render::Render, App as CruxApp};
pub use error::EditError;
pub use event::Event;
pub use model::{EditableField, Listing, ListingForm, ListingId, Model, SaveStage, SessionId};
pub use presentation::{Alert, AlertAction, AlertKind, Locale};
pub use view::ViewModel;

pub const DEFAULT_LISTINGS_BASE: &str = "http://localhost:8000/api/listings/";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u64 = 120_000;

pub const UPLOAD_IMAGE_PATH: &str = "upload-image/";
pub const UPLOAD_LISTING_FIELD: &str = "listing_id";
pub const UPLOAD_IMAGE_FIELD: &str = "image";
// The server stores whatever arrives under this name and type, regardless of
// the picked file's real format.
pub const UPLOAD_FILE_NAME: &str = "listing.jpg";
pub const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";
