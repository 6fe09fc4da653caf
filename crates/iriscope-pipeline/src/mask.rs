//! Class mask derivation and confidence aggregation.
//!
//! Reduces the per-pixel probability map to an integer class mask via
//! argmax, and computes per-class confidence as the mean predicted
//! probability over the pixels assigned to that class.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use ndarray::Array2;

use crate::types::{ClassMask, ClassProbabilityMap, EyeClass, MODEL_SIZE, NUM_CLASSES};

/// Per-pixel argmax over the probability channels.
///
/// Ties are broken toward the lowest class index: a pixel where
/// background and pupil are equally likely is classified as background.
#[must_use]
pub fn class_mask(probs: &ClassProbabilityMap) -> ClassMask {
    let p = probs.as_array();
    Array2::from_shape_fn((MODEL_SIZE, MODEL_SIZE), |(y, x)| {
        let mut best = 0u8;
        let mut best_p = p[[y, x, 0]];
        for c in 1..NUM_CLASSES {
            let v = p[[y, x, c]];
            if v > best_p {
                best_p = v;
                best = c as u8;
            }
        }
        best
    })
}

/// Mean predicted probability of `class` over the pixels the mask
/// assigned to it, or 0.0 when no pixel was assigned.
///
/// The population is mask membership, not the contour the geometry
/// stage selects: when a class has several disjoint regions, the
/// confidence averages over all of them while the circle fit uses
/// only the largest.
#[must_use]
pub fn class_confidence(probs: &ClassProbabilityMap, mask: &ClassMask, class: EyeClass) -> f64 {
    let p = probs.as_array();
    let channel = class.channel();
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for ((y, x), &id) in mask.indexed_iter() {
        if id == class.id() {
            sum += f64::from(p[[y, x, channel]]);
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}
