//! Comb sort over opaque keys.
//!
//! In place and allocation free, so the only extra disk footprint of a
//! file sort is the index itself. Each compare and swap is a disk round
//! trip in the file-backed case.
use std::cmp::Ordering;

use log::debug;

use super::keys::SortKeys;
use crate::error::Result;

/// Gap shrink factor. Affects the number of passes only, never the result.
pub const SHRINK_FACTOR: f64 = 1.247;

/// Work counters for one sort.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CombStats {
    pub passes: u64,
    pub compares: u64,
    pub swaps: u64,
}

/// Next gap: `gap / shrink` floored, at least 1 and strictly smaller than
/// `gap` while `gap > 1`, so every shrink factor terminates.
#[inline]
pub fn next_gap(gap: usize, shrink: f64) -> usize {
    if gap <= 1 {
        return 1;
    }
    let next = (gap as f64 / shrink) as usize;
    next.clamp(1, gap - 1)
}

/// Sort `keys` ascending. Not stable.
///
/// Passes compare `(i, i + gap)` for every `i` below `len - gap`, swapping
/// pairs that are out of order. The loop ends after a swap-free pass
/// at gap 1.
pub fn comb_sort<K: SortKeys + ?Sized>(keys: &mut K, shrink: f64) -> Result<CombStats> {
    let n = keys.len();
    let mut stats = CombStats::default();
    if n < 2 {
        return Ok(stats);
    }

    let mut gap = ((n as f64 / shrink) as usize).max(1);
    loop {
        let mut swapped = false;
        for i in 0..n.saturating_sub(gap) {
            stats.compares += 1;
            if keys.compare(i, i + gap)? == Ordering::Greater {
                keys.swap(i, i + gap)?;
                stats.swaps += 1;
                swapped = true;
            }
        }
        stats.passes += 1;
        debug!("pass {} gap {} swapped {}", stats.passes, gap, swapped);

        if gap == 1 && !swapped {
            break;
        }
        gap = next_gap(gap, shrink);
    }
    Ok(stats)
}
