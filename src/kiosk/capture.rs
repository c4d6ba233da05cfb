//! Values captured at the kiosk, validated before the wizard may advance.

use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixes reported as less precise than this (metres) advance with a warning.
pub const LOW_ACCURACY_THRESHOLD_M: f64 = 100.0;

/// Why a captured value was refused.
#[derive(Debug, Error, PartialEq)]
pub enum CaptureError {
    #[error("PIN must be exactly 4 digits")]
    InvalidPin,
    #[error("Invalid latitude")]
    LatitudeOutOfRange,
    #[error("Invalid longitude")]
    LongitudeOutOfRange,
    #[error("Photo is required")]
    EmptyPhoto,
    #[error("Photo is not valid base64 data")]
    PhotoEncoding,
    #[error("Photo is not an image")]
    NotAnImage,
    #[error("Photo must be a JPEG image")]
    NotJpeg,
}

/// A 4-digit kiosk PIN.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    pub fn parse(raw: &str) -> Result<Self, CaptureError> {
        if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Pin(raw.to_string()))
        } else {
            Err(CaptureError::InvalidPin)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CaptureError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CaptureError::LatitudeOutOfRange);
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CaptureError::LongitudeOutOfRange);
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// A position reported by the device.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lng: f64,
    /// Reported accuracy radius in metres.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl LocationFix {
    pub fn low_accuracy_warning(&self) -> Option<String> {
        self.accuracy
            .filter(|accuracy| *accuracy > LOW_ACCURACY_THRESHOLD_M)
            .map(|accuracy| {
                format!(
                    "Location acquired but accuracy is low ({}m). Please ensure GPS is enabled.",
                    accuracy.round()
                )
            })
    }
}

/// Why the device could not provide a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    PermissionDenied,
    Unavailable,
    Timeout,
    Unsupported,
}

impl LocationError {
    pub fn message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Unable to get location. Please enable location permissions."
            }
            LocationError::Unavailable => {
                "Unable to get location. Location unavailable. Ensure GPS is enabled."
            }
            LocationError::Timeout => "Unable to get location. Request timed out. Please try again.",
            LocationError::Unsupported => "Geolocation not supported on this device.",
        }
    }
}

/// How the device must request its position.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationPolicy {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    /// Zero: cached fixes are refused.
    pub maximum_age_ms: u64,
}

pub const GEOLOCATION_POLICY: GeolocationPolicy = GeolocationPolicy {
    enable_high_accuracy: true,
    timeout_ms: 30_000,
    maximum_age_ms: 0,
};

/// The kiosk camera captures JPEG frames and the backend stores them as such.
pub const PHOTO_MIME_TYPE: &str = "image/jpeg";

/// A still frame from the front camera, decoded from the page's data URL.
#[derive(Clone, PartialEq)]
pub struct CapturedPhoto {
    bytes: Vec<u8>,
}

impl CapturedPhoto {
    /// Decodes `data:image/...;base64,...` or bare base64.
    pub fn from_data_url(raw: &str) -> Result<Self, CaptureError> {
        let encoded = match raw.split_once(',') {
            Some((_, data)) => data,
            None => raw,
        }
        .trim();

        if encoded.is_empty() {
            return Err(CaptureError::EmptyPhoto);
        }

        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| CaptureError::PhotoEncoding)?;
        if bytes.is_empty() {
            return Err(CaptureError::EmptyPhoto);
        }

        let kind = infer::get(&bytes)
            .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .ok_or(CaptureError::NotAnImage)?;
        if kind.mime_type() != PHOTO_MIME_TYPE {
            return Err(CaptureError::NotJpeg);
        }

        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `clock-photo-<millis>.jpg`
    pub fn file_name(&self, taken_at: chrono::DateTime<chrono::Utc>) -> String {
        format!("clock-photo-{}.jpg", taken_at.timestamp_millis())
    }
}

impl fmt::Debug for CapturedPhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedPhoto")
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest byte sequence `infer` recognises as a JPEG.
    pub(crate) const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    pub(crate) fn jpeg_data_url() -> String {
        format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(JPEG_BYTES))
    }

    #[test]
    fn pins_must_be_four_ascii_digits() {
        for bad in ["", "1", "123", "12345", "12a4", "١٢٣٤", " 123", "12 4"] {
            assert_eq!(Pin::parse(bad), Err(CaptureError::InvalidPin), "{:?}", bad);
        }
        assert_eq!(Pin::parse("0042").unwrap().as_str(), "0042");
    }

    #[test]
    fn pin_debug_is_masked() {
        assert_eq!(format!("{:?}", Pin::parse("4821").unwrap()), "Pin(****)");
    }

    #[test]
    fn coordinates_are_bounded() {
        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert_eq!(Coordinates::new(90.1, 0.0), Err(CaptureError::LatitudeOutOfRange));
        assert_eq!(Coordinates::new(0.0, 180.5), Err(CaptureError::LongitudeOutOfRange));
        assert_eq!(Coordinates::new(f64::NAN, 0.0), Err(CaptureError::LatitudeOutOfRange));
    }

    #[test]
    fn low_accuracy_fixes_carry_a_warning() {
        let precise = LocationFix { lat: 1.0, lng: 1.0, accuracy: Some(12.0) };
        let vague = LocationFix { lat: 1.0, lng: 1.0, accuracy: Some(250.4) };
        assert_eq!(precise.low_accuracy_warning(), None);
        assert!(vague.low_accuracy_warning().unwrap().contains("(250m)"));
    }

    #[test]
    fn decodes_data_urls_and_bare_base64() {
        let from_url = CapturedPhoto::from_data_url(&jpeg_data_url()).unwrap();
        assert_eq!(from_url.bytes(), JPEG_BYTES);

        let bare = general_purpose::STANDARD.encode(JPEG_BYTES);
        assert_eq!(CapturedPhoto::from_data_url(&bare).unwrap(), from_url);
    }

    #[test]
    fn rejects_empty_or_non_image_photos() {
        assert_eq!(CapturedPhoto::from_data_url(""), Err(CaptureError::EmptyPhoto));
        assert_eq!(
            CapturedPhoto::from_data_url("data:image/jpeg;base64,"),
            Err(CaptureError::EmptyPhoto)
        );
        assert_eq!(CapturedPhoto::from_data_url("%%%"), Err(CaptureError::PhotoEncoding));
        let text = general_purpose::STANDARD.encode(b"hello world");
        assert_eq!(CapturedPhoto::from_data_url(&text), Err(CaptureError::NotAnImage));
    }

    #[test]
    fn only_jpeg_frames_are_accepted() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
        let data_url = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png));
        assert_eq!(CapturedPhoto::from_data_url(&data_url), Err(CaptureError::NotJpeg));
    }

    #[test]
    fn file_name_uses_millis_and_jpg_extension() {
        let photo = CapturedPhoto::from_data_url(&jpeg_data_url()).unwrap();
        let at = chrono::DateTime::from_timestamp_millis(1_760_000_000_123).unwrap();
        assert_eq!(photo.file_name(at), "clock-photo-1760000000123.jpg");
    }
}
