//! Integer coordinate scaling between zoom levels
//!
//! Zoom levels differ by powers of two, so moving a pixel coordinate from one
//! level to another is a bit shift: left when zooming in, right when zooming
//! out.

/// Scale `n` by `2^dz`.
///
/// Positive deltas (more detail) shift left, negative deltas shift right,
/// and a zero delta is the identity. Only non-negative coordinates are
/// meaningful; negative inputs round toward negative infinity.
pub fn scale_by_zoom_delta(n: i64, dz: i32) -> i64 {
    match dz {
        0 => n,
        dz if dz > 0 => n << dz.min(62),
        dz => {
            let shift = dz.unsigned_abs();
            if shift >= 63 {
                if n < 0 {
                    -1
                } else {
                    0
                }
            } else {
                n >> shift
            }
        }
    }
}

/// Scale a non-negative tile dimension, never collapsing to zero.
pub(crate) fn scale_dimension(n: u32, dz: i32) -> u32 {
    scale_by_zoom_delta(n as i64, dz).clamp(1, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(scale_by_zoom_delta(0, 0), 0);
        assert_eq!(scale_by_zoom_delta(1234, 0), 1234);
    }

    #[test]
    fn test_zoom_in_shifts_left() {
        assert_eq!(scale_by_zoom_delta(256, 1), 512);
        assert_eq!(scale_by_zoom_delta(100, 3), 800);
    }

    #[test]
    fn test_zoom_out_floors() {
        assert_eq!(scale_by_zoom_delta(256, -1), 128);
        assert_eq!(scale_by_zoom_delta(255, -1), 127);
        assert_eq!(scale_by_zoom_delta(7, -3), 0);
    }

    #[test]
    fn test_round_trip_on_aligned_values() {
        for dz in -6i32..=6 {
            let step = 1i64 << dz.unsigned_abs();
            for k in 0..20 {
                let n = k * step;
                assert_eq!(scale_by_zoom_delta(scale_by_zoom_delta(n, dz), -dz), n, "n={} dz={}", n, dz);
            }
        }
    }

    #[test]
    fn test_large_negative_delta_saturates() {
        assert_eq!(scale_by_zoom_delta(i64::MAX, -80), 0);
    }

    #[test]
    fn test_scale_dimension_stays_positive() {
        assert_eq!(scale_dimension(256, -1), 128);
        assert_eq!(scale_dimension(256, -12), 1);
        assert_eq!(scale_dimension(256, 2), 1024);
    }
}
