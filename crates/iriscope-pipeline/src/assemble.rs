//! Final result assembly: ratio derivation and output rounding.

use std::time::Duration;

use crate::types::{Circle, Confidence, Detection};

/// Combine the per-class circles and confidences into a [`Detection`].
///
/// The pupil/iris radius ratio is derived only when both circles are
/// present and the iris radius is strictly positive; otherwise it is
/// absent. Confidences are rounded to 3 decimal places, the ratio to
/// 4, and the elapsed time to 0.1 ms. Circle coordinates are reported
/// at full precision.
#[must_use]
pub fn assemble(
    pupil: Option<Circle>,
    iris: Option<Circle>,
    pupil_confidence: f64,
    iris_confidence: f64,
    elapsed: Duration,
) -> Detection {
    let ratio = match (pupil, iris) {
        (Some(p), Some(i)) if i.radius > 0.0 => Some(round_to(p.radius / i.radius, 4)),
        _ => None,
    };

    Detection {
        pupil,
        iris,
        confidence: Confidence {
            pupil: round_to(pupil_confidence, 3),
            iris: round_to(iris_confidence, 3),
        },
        ratio,
        inference_ms: round_to(elapsed.as_secs_f64() * 1000.0, 1),
    }
}

/// Half-away-from-zero rounding to a fixed number of decimals.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
