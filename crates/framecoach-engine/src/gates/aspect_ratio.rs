//! Aspect ratio gate (priority 0).

use framecoach_models::{CameraAspectRatio, GateId, GateMetadata, GateResult};

use super::{Gate, GateContext};
use crate::error::{EngineError, EngineResult};

/// Binary check that the camera uses the reference's aspect ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct AspectRatioGate;

impl Gate for AspectRatioGate {
    type State = ();

    fn id(&self) -> GateId {
        GateId::AspectRatio
    }

    fn evaluate(&self, ctx: &GateContext<'_>, _state: &mut ()) -> EngineResult<GateResult> {
        let current = CameraAspectRatio::classify(ctx.live.image_size).ok_or_else(|| {
            EngineError::degenerate(format!(
                "image size {}x{} has no aspect ratio",
                ctx.live.image_size.width, ctx.live.image_size.height
            ))
        })?;

        let Some(reference) = ctx.reference.baseline() else {
            return Ok(GateResult::new(self.id(), 1.0, 0.0, "No reference set").with_metadata(
                GateMetadata::AspectRatio {
                    current: Some(current),
                    reference: None,
                },
            ));
        };

        let metadata = GateMetadata::AspectRatio {
            current: Some(current),
            reference: Some(reference.aspect_ratio),
        };

        let result = if current == reference.aspect_ratio {
            GateResult::new(self.id(), 1.0, 1.0, format!("Aspect ratio matches ({})", current))
        } else {
            GateResult::new(
                self.id(),
                0.0,
                1.0,
                format!("Switch the camera to {}", reference.aspect_ratio),
            )
            .with_debug(format!("current {} vs reference {}", current, reference.aspect_ratio))
        };

        Ok(result.with_metadata(metadata))
    }
}
