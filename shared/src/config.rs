use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{HttpError, ValidatedUrl, DEFAULT_PICKER_QUALITY};
use crate::model::ListingId;
use crate::presentation::Locale;
use crate::{
    DEFAULT_LISTINGS_BASE, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_UPLOAD_TIMEOUT_MS,
    UPLOAD_IMAGE_PATH,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid listings base URL: {0}")]
    InvalidBaseUrl(#[source] HttpError),
    #[error("timeout for {name} must be between 1 and {max} ms, got {value}")]
    InvalidTimeout { name: &'static str, value: u64, max: u64 },
}

/// Settings the shell supplies once, before the screen mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// The `LISTINGS` base path, e.g. `https://host/api/listings/`.
    pub listings_base: String,
    pub request_timeout_ms: u64,
    pub upload_timeout_ms: u64,
    pub picker_quality: f32,
    pub locale: Locale,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            listings_base: DEFAULT_LISTINGS_BASE.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            upload_timeout_ms: DEFAULT_UPLOAD_TIMEOUT_MS,
            picker_quality: DEFAULT_PICKER_QUALITY,
            locale: Locale::default(),
        }
    }
}

impl EditorConfig {
    /// Normalizes the base path to end in `/` and checks every field the
    /// requests depend on.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let max = crate::capabilities::MAX_TIMEOUT_MS;
        for (name, value) in [
            ("request_timeout_ms", self.request_timeout_ms),
            ("upload_timeout_ms", self.upload_timeout_ms),
        ] {
            if value == 0 || value > max {
                return Err(ConfigError::InvalidTimeout { name, value, max });
            }
        }

        let base = self.listings_base.trim();
        self.listings_base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        ValidatedUrl::new(self.listings_base.clone()).map_err(ConfigError::InvalidBaseUrl)?;

        if !self.picker_quality.is_finite() {
            self.picker_quality = DEFAULT_PICKER_QUALITY;
        }
        self.picker_quality = self.picker_quality.clamp(0.0, 1.0);

        Ok(self)
    }

    pub fn api(&self) -> ListingsApi<'_> {
        ListingsApi {
            base: &self.listings_base,
        }
    }
}

/// Endpoint paths under the listings base.
#[derive(Debug, Clone, Copy)]
pub struct ListingsApi<'a> {
    base: &'a str,
}

impl ListingsApi<'_> {
    /// `{base}{id}/`, used for both the read and the update.
    pub fn listing_url(&self, id: ListingId) -> Result<ValidatedUrl, HttpError> {
        ValidatedUrl::new(format!("{}{id}/", self.base))
    }

    pub fn upload_image_url(&self) -> Result<ValidatedUrl, HttpError> {
        ValidatedUrl::new(format!("{}{UPLOAD_IMAGE_PATH}", self.base))
    }
}
