use crux_core::capability::{CapabilityContext, Operation};
use crux_core::macros::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PICKER_QUALITY: f32 = 0.8;

/// Device media library access: permission prompt plus the system picker.
#[derive(Capability)]
pub struct ImagePicker<Ev> {
    context: CapabilityContext<PickerOperation, Ev>,
}

impl<Ev> ImagePicker<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<PickerOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn request_permission<F>(&self, callback: F)
    where
        F: FnOnce(PickerResult) -> Ev + Send + 'static,
    {
        self.request(PickerOperation::RequestMediaLibraryPermission, callback);
    }

    pub fn pick_from_library<F>(&self, config: GalleryPickConfig, callback: F)
    where
        F: FnOnce(PickerResult) -> Ev + Send + 'static,
    {
        let config = config.validated();
        self.request(PickerOperation::LaunchImageLibrary { config }, callback);
    }

    fn request<F>(&self, operation: PickerOperation, callback: F)
    where
        F: FnOnce(PickerResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PickerOperation {
    RequestMediaLibraryPermission,
    LaunchImageLibrary { config: GalleryPickConfig },
}

impl Operation for PickerOperation {
    type Output = PickerResult;
}

/// Options for the system library picker. Only still images are offered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryPickConfig {
    pub allow_multiple: bool,
    /// Compression quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for GalleryPickConfig {
    fn default() -> Self {
        Self {
            allow_multiple: false,
            quality: DEFAULT_PICKER_QUALITY,
        }
    }
}

impl GalleryPickConfig {
    pub fn single_image() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.quality = if self.quality.is_finite() {
            self.quality.clamp(0.0, 1.0)
        } else {
            DEFAULT_PICKER_QUALITY
        };
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    DeniedPermanently,
    Restricted,
    #[default]
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// A locally picked file. Only the reference travels through the core; the
/// shell reads the bytes when it builds the upload body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedAsset {
    pub uri: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl PickedAsset {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            width: None,
            height: None,
            file_name: None,
            mime_type: None,
            file_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickerOutput {
    PermissionStatus(PermissionStatus),
    Picked(Vec<PickedAsset>),
    Cancelled,
}

impl PickerOutput {
    /// The first asset of a completed selection, if any were returned.
    pub fn into_first_asset(self) -> Option<PickedAsset> {
        match self {
            PickerOutput::Picked(assets) => assets.into_iter().next(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PickerError {
    #[error("media library unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("picker busy - another operation in progress")]
    Busy,

    #[error("app in background - picker not allowed")]
    BackgroundRestricted,

    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type PickerResult = Result<PickerOutput, PickerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_pick_config_defaults() {
        let config = GalleryPickConfig::single_image();
        assert!(!config.allow_multiple);
        assert!((config.quality - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_gallery_pick_config_quality_clamped() {
        assert!((GalleryPickConfig::default().with_quality(3.0).validated().quality - 1.0).abs()
            < f32::EPSILON);
        assert!(GalleryPickConfig::default().with_quality(-1.0).validated().quality.abs()
            < f32::EPSILON);
        assert!(
            (GalleryPickConfig::default()
                .with_quality(f32::NAN)
                .validated()
                .quality
                - DEFAULT_PICKER_QUALITY)
                .abs()
                < f32::EPSILON
        );
    }

    #[test]
    fn test_permission_status() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
        assert!(!PermissionStatus::default().is_granted());
        assert!(!PermissionStatus::DeniedPermanently.is_granted());
    }

    #[test]
    fn test_first_asset_of_selection() {
        let output = PickerOutput::Picked(vec![
            PickedAsset::new("file:///a.jpg"),
            PickedAsset::new("file:///b.jpg"),
        ]);
        assert_eq!(output.into_first_asset().unwrap().uri, "file:///a.jpg");

        assert!(PickerOutput::Picked(Vec::new()).into_first_asset().is_none());
        assert!(PickerOutput::Cancelled.into_first_asset().is_none());
    }

    #[test]
    fn test_asset_deserializes_with_only_uri() {
        let asset: PickedAsset = serde_json::from_str(r#"{"uri":"file:///x.jpg"}"#).unwrap();
        assert_eq!(asset, PickedAsset::new("file:///x.jpg"));
    }
}
