//! Splits a frame count into one window per output column.

use std::ops::Range;

use crate::error::{Result, ThumbnailError};

/// Number of frames the windows will cover: `min(total, cap)`, never below one.
pub fn used_frames(total_frames: u64, cap: Option<u64>) -> u64 {
    cap.map_or(total_frames, |cap| total_frames.min(cap)).max(1)
}

/// Computes `width` frame ranges covering `[0, used_frames(total_frames, cap))`.
///
/// Range `i` spans `floor(i*U/W)..floor((i+1)*U/W)`. When there are fewer frames than
/// columns some of those would be empty; their right edge is pushed out by one so that
/// every window holds at least one frame. Neighbouring windows then share that frame.
pub fn schedule(total_frames: u64, width: u32, cap: Option<u64>) -> Result<Vec<Range<u64>>> {
    if total_frames == 0 {
        return Err(ThumbnailError::EmptyStream);
    }
    if width == 0 {
        return Err(ThumbnailError::InvalidConfig("width must be at least 1".into()));
    }

    let used = used_frames(total_frames, cap) as u128;
    let w = width as u128;
    let edge = |i: u128| (i * used / w) as u64;

    Ok((0..w)
        .map(|i| {
            let start = edge(i);
            let end = edge(i + 1).max(start + 1);
            start..end
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[Range<u64>], width: u32, used: u64) {
        assert_eq!(ranges.len(), width as usize);
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges.last().unwrap().end, used);
        for r in ranges {
            assert!(r.end > r.start, "empty window {:?}", r);
        }
        for pair in ranges.windows(2) {
            assert!(pair[1].start >= pair[0].start);
            if used >= width as u64 {
                assert_eq!(pair[0].end, pair[1].start, "gap or overlap at {:?}", pair);
            } else {
                assert!(pair[1].start <= pair[0].end);
            }
        }
    }

    #[test]
    fn exact_division() {
        let ranges = schedule(800, 80, None).unwrap();
        assert_covers(&ranges, 80, 800);
        assert!(ranges.iter().all(|r| r.end - r.start == 10));
    }

    #[test]
    fn uneven_division_differs_by_at_most_one() {
        let ranges = schedule(44_101, 80, None).unwrap();
        assert_covers(&ranges, 80, 44_101);
        let lens: Vec<u64> = ranges.iter().map(|r| r.end - r.start).collect();
        let min = *lens.iter().min().unwrap();
        let max = *lens.iter().max().unwrap();
        assert!(max - min <= 1);
        assert_eq!(lens.iter().sum::<u64>(), 44_101);
    }

    #[test]
    fn fewer_frames_than_columns() {
        for total in [1, 2, 7, 20, 79] {
            let ranges = schedule(total, 80, None).unwrap();
            assert_covers(&ranges, 80, total);
        }
        let single = schedule(1, 80, None).unwrap();
        assert!(single.iter().all(|r| *r == (0..1)));
    }

    #[test]
    fn exhaustive_small_grid() {
        for total in 1..=64u64 {
            for width in 1..=40u32 {
                let ranges = schedule(total, width, None).unwrap();
                assert_covers(&ranges, width, total);
            }
        }
    }

    #[test]
    fn cap_limits_the_covered_prefix() {
        let ranges = schedule(10 * 44_100, 80, Some(44_100)).unwrap();
        assert_covers(&ranges, 80, 44_100);

        let ranges = schedule(100, 80, Some(1_000)).unwrap();
        assert_covers(&ranges, 80, 100);

        // a zero cap still yields one usable frame
        let ranges = schedule(100, 4, Some(0)).unwrap();
        assert_covers(&ranges, 4, 1);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let ranges = schedule(u64::MAX / 2, 1920, None).unwrap();
        assert_covers(&ranges, 1920, u64::MAX / 2);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(matches!(schedule(0, 80, None), Err(ThumbnailError::EmptyStream)));
        assert!(matches!(schedule(10, 0, None), Err(ThumbnailError::InvalidConfig(_))));
        assert_eq!(schedule(10, 1, None).unwrap(), vec![0..10]);
    }
}
