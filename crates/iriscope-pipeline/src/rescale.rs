//! Mapping fitted circles from model-space back to original-image
//! coordinates.

use crate::types::{Circle, Dimensions, MODEL_SIZE};

/// Scale a model-space circle to the original image's pixel frame.
///
/// Centers scale independently per axis, undoing the non-uniform
/// stretch the preprocessor applied. The radius scales by the average
/// of the two factors: a single isotropic approximation, not a
/// geometric correction (an elongated source image really maps a
/// circle to an ellipse).
///
/// Absent circles pass through as absent.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rescale(circle: Option<Circle>, original: Dimensions) -> Option<Circle> {
    circle.map(|c| {
        let scale_x = f64::from(original.width) / MODEL_SIZE as f64;
        let scale_y = f64::from(original.height) / MODEL_SIZE as f64;
        Circle {
            x: c.x * scale_x,
            y: c.y * scale_y,
            radius: c.radius * ((scale_x + scale_y) / 2.0),
        }
    })
}
