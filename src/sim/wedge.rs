//! Wedge resolution under the needle
//!
//! Wedges are laid out clockwise from 0°, each spanning `360 / count` degrees,
//! with wedge 0 centred on the needle at rest angle 0. The needle sits fixed at
//! north. This is pure geometry: it knows nothing about wedge weights, which only
//! matter to weighted outcome selection.

use crate::error::WedgeError;
use crate::normalize_degrees;

/// Wedge under the needle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WedgeResult<'a, T> {
    pub index: usize,
    pub wedge: &'a T,
}

/// Index of the wedge under the needle for a wheel resting at `angle` degrees
pub fn wedge_index(angle: f64, wedge_count: usize) -> Result<usize, WedgeError> {
    if wedge_count == 0 {
        return Err(WedgeError::EmptyWedgeSet);
    }
    let size = 360.0 / wedge_count as f64;
    let norm = normalize_degrees(angle);
    let shifted = normalize_degrees(360.0 - norm + size / 2.0);
    let index = (shifted / size).floor() as usize;
    // Float rounding near 360 can push the quotient to exactly `wedge_count`
    Ok(index.min(wedge_count - 1))
}

/// Resolve the wedge under the needle
pub fn determine_wedge_result<T>(angle: f64, wedges: &[T]) -> Result<WedgeResult<'_, T>, WedgeError> {
    let index = wedge_index(angle, wedges.len())?;
    Ok(WedgeResult {
        index,
        wedge: &wedges[index],
    })
}

/// A rest angle that resolves to `index`
///
/// `offset_fraction` moves the angle away from the wedge centre as a fraction of
/// the wedge size and is clamped to ±0.45 so the result stays inside the wedge.
pub fn angle_for_index(index: usize, wedge_count: usize, offset_fraction: f64) -> Result<f64, WedgeError> {
    if wedge_count == 0 {
        return Err(WedgeError::EmptyWedgeSet);
    }
    if index >= wedge_count {
        return Err(WedgeError::IndexOutOfRange {
            index,
            count: wedge_count,
        });
    }
    let size = 360.0 / wedge_count as f64;
    let offset = if offset_fraction.is_finite() {
        offset_fraction.clamp(-0.45, 0.45)
    } else {
        0.0
    };
    Ok(normalize_degrees(-(index as f64 + offset) * size))
}
