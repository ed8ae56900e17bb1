//! Reference baseline construction.

use framecoach_models::{CameraAspectRatio, GateSettings, ReferenceAnalysis, ReferenceData};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::estimators::{
    classify_shot_type, estimate_distance_m, shoulder_pixel_width, FocalLengthResolver,
};

/// Build the immutable baseline from a one-time reference analysis.
///
/// The zoom factor, when not supplied, is recovered through the same
/// resolver the lens gate uses so both sides agree on the lens table.
pub fn build_reference(
    analysis: &ReferenceAnalysis,
    resolver: &FocalLengthResolver,
    settings: &GateSettings,
    config: &EngineConfig,
) -> EngineResult<ReferenceData> {
    let image = analysis.image_size;
    if image.is_degenerate() {
        return Err(EngineError::degenerate(format!(
            "reference image {}x{} is degenerate",
            image.width, image.height
        )));
    }
    let aspect_ratio = match analysis.aspect_ratio {
        Some(ratio) => ratio,
        None => CameraAspectRatio::classify(image).ok_or_else(|| {
            EngineError::degenerate(format!(
                "reference image {}x{} has no aspect ratio",
                image.width, image.height
            ))
        })?,
    };

    let focal_mm = analysis.focal_length.mm();
    if !(focal_mm.is_finite() && focal_mm > 0.0) {
        return Err(EngineError::degenerate(format!(
            "reference focal length must be positive, got {}",
            focal_mm
        )));
    }

    let threshold = config.confidence_threshold;
    let shot_type = classify_shot_type(&analysis.keypoints, analysis.bbox.as_ref(), threshold);

    let image_width = f64::from(image.width);
    let shoulder_px = shoulder_pixel_width(&analysis.keypoints, image, threshold);
    let shoulder_ratio = shoulder_px.map(|px| px / image_width);
    let estimated_distance_m = shoulder_px.and_then(|px| {
        estimate_distance_m(px, image_width, focal_mm, settings.body_type.shoulder_width_m())
    });

    let zoom_factor = match analysis.zoom_factor {
        Some(zoom) if zoom.is_finite() && zoom > 0.0 => Some(zoom),
        _ => Some(resolver.zoom_for_focal_length(focal_mm)?),
    };

    info!(
        aspect_ratio = %aspect_ratio,
        shot_type = ?shot_type,
        focal_mm,
        estimated = analysis.focal_length.is_estimated(),
        ?estimated_distance_m,
        ?zoom_factor,
        "Reference baseline built"
    );

    Ok(ReferenceData {
        bbox: analysis.bbox,
        image_size: image,
        aspect_ratio,
        keypoints: analysis.keypoints.clone(),
        shot_type,
        focal_length: analysis.focal_length,
        zoom_factor,
        shoulder_ratio,
        estimated_distance_m,
        compression_index: analysis.compression_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::fixtures::full_body;
    use framecoach_models::{ImageSize, ReferenceFocalLength, ShotType};

    fn analysis(image: ImageSize, focal: ReferenceFocalLength) -> ReferenceAnalysis {
        ReferenceAnalysis {
            keypoints: full_body(0.5, 0.1, 0.9),
            bbox: None,
            image_size: image,
            aspect_ratio: None,
            focal_length: focal,
            zoom_factor: None,
            compression_index: Some(0.4),
        }
    }

    #[test]
    fn test_builds_full_baseline() {
        let data = build_reference(
            &analysis(ImageSize::new(3024, 4032), ReferenceFocalLength::Exif { mm: 52.0 }),
            &FocalLengthResolver::default(),
            &GateSettings::default(),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(data.aspect_ratio, CameraAspectRatio::Ratio4x3);
        assert_eq!(data.shot_type, Some(ShotType::FullShot));
        let ratio = data.shoulder_ratio.unwrap();
        assert!((ratio - 0.1).abs() < 1e-9, "shoulder ratio {}", ratio);
        // 0.40m * 52mm / (0.1 * 36mm)
        let distance = data.estimated_distance_m.unwrap();
        assert!((distance - 0.4 * 52.0 / 3.6).abs() < 1e-6, "distance {}", distance);
        assert!((data.zoom_factor.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(data.compression_index, Some(0.4));
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let mut input = analysis(ImageSize::new(1080, 1920), ReferenceFocalLength::Exif { mm: 26.0 });
        input.aspect_ratio = Some(CameraAspectRatio::Ratio1x1);
        input.zoom_factor = Some(1.3);
        let data = build_reference(
            &input,
            &FocalLengthResolver::default(),
            &GateSettings::default(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(data.aspect_ratio, CameraAspectRatio::Ratio1x1);
        assert_eq!(data.zoom_factor, Some(1.3));
    }

    #[test]
    fn test_degenerate_inputs_are_rejected() {
        let resolver = FocalLengthResolver::default();
        let settings = GateSettings::default();
        let config = EngineConfig::default();

        let err = build_reference(
            &analysis(ImageSize::new(0, 1920), ReferenceFocalLength::Exif { mm: 26.0 }),
            &resolver,
            &settings,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::DegenerateGeometry(_)));

        let err = build_reference(
            &analysis(ImageSize::new(1080, 1920), ReferenceFocalLength::Exif { mm: 0.0 }),
            &resolver,
            &settings,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::DegenerateGeometry(_)));
    }
}
