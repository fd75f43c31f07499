// src/services/exif.rs
// DOCUMENTATION: Image metadata extraction
// PURPOSE: Read GPS coordinates and camera settings from uploaded photo bytes

use crate::models::{CameraDetails, Coordinate};
use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

/// Everything the upload pipeline needs from a photo's embedded metadata
/// DOCUMENTATION: `is_original` gates competition submissions - screenshots
/// and edited exports carry no capture settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub coords: Option<Coordinate>,
    pub camera: Option<CameraDetails>,
    pub is_original: bool,
}

/// Extract metadata from raw image bytes
/// DOCUMENTATION: Never fails - any parse error yields the all-absent
/// default so metadata problems cannot block the upload pipeline
pub fn extract_metadata(bytes: &[u8]) -> ExtractedMetadata {
    match try_extract(bytes) {
        Ok(metadata) => metadata,
        Err(e) => {
            log::debug!("EXIF extraction failed, treating as metadata-free: {}", e);
            ExtractedMetadata::default()
        }
    }
}

fn try_extract(bytes: &[u8]) -> Result<ExtractedMetadata, exif::Error> {
    let exif = Reader::new().read_from_container(&mut Cursor::new(bytes))?;

    let lat = dms_triplet(&exif, Tag::GPSLatitude);
    let lat_ref = ascii_value(&exif, Tag::GPSLatitudeRef);
    let lng = dms_triplet(&exif, Tag::GPSLongitude);
    let lng_ref = ascii_value(&exif, Tag::GPSLongitudeRef);

    // All four GPS tags must be present; never a partially populated coordinate
    let coords = match (lat, lat_ref.as_deref(), lng, lng_ref.as_deref()) {
        (Some((d, m, s)), Some(lat_ref), Some((d2, m2, s2)), Some(lng_ref)) => Some(Coordinate {
            lat: dms_to_decimal(d, m, s, lat_ref),
            lng: dms_to_decimal(d2, m2, s2, lng_ref),
        }),
        _ => None,
    };

    let model = ascii_value(&exif, Tag::Model).map(|s| sanitize_tag_text(&s));
    let exposure_time = rational_value(&exif, Tag::ExposureTime)
        .map(|(num, denom)| format!("{}/{}s", num, denom));
    let f_number = rational_value(&exif, Tag::FNumber)
        .map(|(num, denom)| format!("f/{}", num as f64 / denom as f64));
    let iso = uint_value(&exif, Tag::PhotographicSensitivity).map(|v| v.to_string());

    let camera = build_camera_details(model, exposure_time, f_number, iso);
    let is_original = is_original_capture(&camera);

    Ok(ExtractedMetadata {
        coords,
        camera,
        is_original,
    })
}

/// Convert a degrees/minutes/seconds triplet to signed decimal degrees
/// DOCUMENTATION: Negated for southern and western hemisphere references
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, reference: &str) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    if reference == "S" || reference == "W" {
        -value
    } else {
        value
    }
}

/// Assemble the camera descriptor; present iff at least one field is present
pub fn build_camera_details(
    model: Option<String>,
    exposure_time: Option<String>,
    f_number: Option<String>,
    iso: Option<String>,
) -> Option<CameraDetails> {
    let details = CameraDetails {
        model,
        exposure_time,
        f_number,
        iso,
    };
    if details.is_empty() {
        None
    } else {
        Some(details)
    }
}

/// Originality rule: a camera model plus at least one capture setting
pub fn is_original_capture(camera: &Option<CameraDetails>) -> bool {
    match camera {
        Some(details) => {
            details.model.is_some()
                && (details.exposure_time.is_some()
                    || details.f_number.is_some()
                    || details.iso.is_some())
        }
        None => false,
    }
}

/// Strip embedded NULs and trim whitespace from an EXIF text field
fn sanitize_tag_text(raw: &str) -> String {
    raw.replace('\0', "").trim().to_string()
}

fn dms_triplet(exif: &exif::Exif, tag: Tag) -> Option<(f64, f64, f64)> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(v) if v.len() == 3 => {
            Some((v[0].to_f64(), v[1].to_f64(), v[2].to_f64()))
        }
        _ => None,
    }
}

fn rational_value(exif: &exif::Exif, tag: Tag) -> Option<(u32, u32)> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(v) if !v.is_empty() && v[0].denom != 0 => Some((v[0].num, v[0].denom)),
        _ => None,
    }
}

fn uint_value(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    field.value.get_uint(0)
}

fn ascii_value(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(v) if !v.is_empty() => {
            Some(String::from_utf8_lossy(&v[0]).to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dms_to_decimal_reference_scenario() {
        // GPSLatitude=[40,26,46] N / GPSLongitude=[79,56,55] W
        let lat = dms_to_decimal(40.0, 26.0, 46.0, "N");
        let lng = dms_to_decimal(79.0, 56.0, 55.0, "W");
        assert!((lat - 40.4461).abs() < 1e-4);
        assert!((lng - (-79.9486)).abs() < 1e-4);
    }

    #[test]
    fn test_dms_sign_follows_hemisphere() {
        assert!(dms_to_decimal(10.0, 0.0, 0.0, "S") < 0.0);
        assert!(dms_to_decimal(10.0, 0.0, 0.0, "W") < 0.0);
        assert!(dms_to_decimal(10.0, 0.0, 0.0, "N") > 0.0);
        assert!(dms_to_decimal(10.0, 0.0, 0.0, "E") > 0.0);
    }

    #[test]
    fn test_dms_magnitude() {
        let v = dms_to_decimal(12.0, 30.0, 36.0, "N");
        assert!((v - (12.0 + 30.0 / 60.0 + 36.0 / 3600.0)).abs() < 1e-9);
    }

    #[test]
    fn test_garbage_bytes_yield_all_absent() {
        let metadata = extract_metadata(b"definitely not a jpeg");
        assert_eq!(metadata, ExtractedMetadata::default());
        assert!(metadata.coords.is_none());
        assert!(metadata.camera.is_none());
        assert!(!metadata.is_original);
    }

    #[test]
    fn test_empty_bytes_yield_all_absent() {
        let metadata = extract_metadata(&[]);
        assert!(metadata.coords.is_none());
    }

    #[test]
    fn test_camera_details_absent_when_all_fields_missing() {
        assert!(build_camera_details(None, None, None, None).is_none());
    }

    #[test]
    fn test_camera_details_present_with_single_field() {
        let details = build_camera_details(None, None, None, Some("200".to_string())).unwrap();
        assert_eq!(details.iso.as_deref(), Some("200"));
        assert!(details.model.is_none());
    }

    #[test]
    fn test_originality_requires_model_and_setting() {
        // Model alone is not enough
        let model_only =
            build_camera_details(Some("Pixel 8".to_string()), None, None, None);
        assert!(!is_original_capture(&model_only));

        // Setting alone is not enough
        let iso_only = build_camera_details(None, None, None, Some("100".to_string()));
        assert!(!is_original_capture(&iso_only));

        // Model plus one setting qualifies
        let both = build_camera_details(
            Some("Pixel 8".to_string()),
            Some("1/250s".to_string()),
            None,
            None,
        );
        assert!(is_original_capture(&both));
    }

    #[test]
    fn test_sanitize_tag_text() {
        assert_eq!(sanitize_tag_text("  NIKON D750\0\0 "), "NIKON D750");
    }
}
