//! Adaptive-binned pixel histogram with percentile and sigma queries.
//!
//! The histogram drives stretch-endpoint resolution: percentile and
//! sigma-clipped anchors, plus the 256-entry equalization table for the
//! histogram-equalized stretch mode. It is a disposable artifact of one
//! pixel plane; build, query, discard.

use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::pixels::PixelData;

/// Nominal bin count. The frequency table holds one extra slot so a sample
/// exactly at the upper bound lands in a bin instead of overflowing.
pub const HIST_BINS: usize = 4096;

/// Index span (half the bin count) below which the first pass is considered
/// too narrow and the bounds are re-centered.
const SPREAD_SPAN: usize = HIST_BINS / 2;

/// Fraction of samples allowed past either bound before a re-bin.
const TAIL_FRACTION: f64 = 0.01;

/// Per-tail fraction used by the narrow-range spread check (0.05%).
const SPREAD_TAIL: f64 = 0.0005;

#[derive(Debug, Clone)]
pub struct Histogram {
    counts: Vec<u32>,
    bin_size: f64,
    hist_min: f64,
    hist_max: f64,
    data_min: f64,
    data_max: f64,
    good_pix: u64,
    underflow: u64,
    overflow: u64,
}

impl Histogram {
    /// Build a histogram over every non-blank sample of `pixels`.
    ///
    /// `known_min`/`known_max` seed the bounds when the caller already has
    /// them; otherwise the true extrema are found by scanning (blank
    /// sentinels and NaN are skipped throughout). The bounds adapt: a pass
    /// that throws more than 1% of samples past either end is redone against
    /// the true extrema, and a first pass whose 0.05%..99.95% span covers
    /// fewer than half the bins is redone zoomed in on that span. At most
    /// two passes run.
    pub fn build(
        pixels: &PixelData,
        known_min: Option<f64>,
        known_max: Option<f64>,
        blank: Option<i64>,
    ) -> Histogram {
        let (scan_min, scan_max) = pixels.min_max(blank).unwrap_or((0.0, 0.0));
        let mut min = known_min.unwrap_or(scan_min);
        let mut max = known_max.unwrap_or(scan_max);

        let mut doing_redo = false;
        loop {
            let mut bin_size = (max - min) / HIST_BINS as f64;
            if bin_size == 0.0 {
                bin_size = 1.0;
            }

            let mut counts = vec![0u32; HIST_BINS + 1];
            let mut good_pix = 0u64;
            let mut underflow = 0u64;
            let mut overflow = 0u64;
            let mut true_min = f64::INFINITY;
            let mut true_max = f64::NEG_INFINITY;

            for i in 0..pixels.len() {
                if pixels.is_blank_at(i, blank) {
                    continue;
                }
                let v = pixels.get_f64(i);
                if v < true_min {
                    true_min = v;
                }
                if v > true_max {
                    true_max = v;
                }
                good_pix += 1;

                let bin = libm::floor((v - min) / bin_size) as i64;
                if bin < 0 {
                    underflow += 1;
                } else if bin > HIST_BINS as i64 {
                    overflow += 1;
                } else {
                    counts[bin as usize] += 1;
                }
            }

            if good_pix == 0 {
                return Histogram {
                    counts,
                    bin_size,
                    hist_min: min,
                    hist_max: max,
                    data_min: 0.0,
                    data_max: 0.0,
                    good_pix: 0,
                    underflow: 0,
                    overflow: 0,
                };
            }

            let tail_limit = good_pix as f64 * TAIL_FRACTION;
            if !doing_redo
                && (underflow as f64 > tail_limit || overflow as f64 > tail_limit)
            {
                debug!(
                    "re-binning: {underflow} under / {overflow} over of {good_pix} samples"
                );
                min = true_min;
                max = true_max;
                doing_redo = true;
                continue;
            }

            if !doing_redo {
                let tail = good_pix as f64 * SPREAD_TAIL;
                let low_idx = cumulative_index_from_low(&counts, tail);
                let high_idx = cumulative_index_from_high(&counts, tail);
                if high_idx >= low_idx && high_idx - low_idx < SPREAD_SPAN {
                    debug!(
                        "re-binning: narrow span {}..{} of {} bins",
                        low_idx,
                        high_idx,
                        HIST_BINS + 1
                    );
                    let new_min = min + low_idx as f64 * bin_size;
                    let new_max = min + high_idx as f64 * bin_size;
                    min = new_min;
                    max = new_max;
                    doing_redo = true;
                    continue;
                }
            }

            return Histogram {
                counts,
                bin_size,
                hist_min: min,
                hist_max: max,
                data_min: true_min,
                data_max: true_max,
                good_pix,
                underflow,
                overflow,
            };
        }
    }

    /// Data number at cumulative percentile `p` (0..=100).
    ///
    /// 0 and 100 map directly to the true data extrema. `round_up` returns
    /// the upper edge of the matched bin instead of the lower.
    pub fn get_pct(&self, p: f64, round_up: bool) -> f64 {
        if self.good_pix == 0 {
            return 0.0;
        }
        if p <= 0.0 {
            return self.data_min;
        }
        if p >= 100.0 {
            return self.data_max;
        }

        let target = self.good_pix as f64 * p / 100.0;
        let mut sum = 0u64;
        for (i, &c) in self.counts.iter().enumerate() {
            sum += c as u64;
            if sum as f64 >= target {
                let bin = if round_up { i + 1 } else { i };
                return bin as f64 * self.bin_size + self.hist_min;
            }
        }
        self.data_max
    }

    /// Robust sigma-clipped stretch anchor:
    /// `median + k * (pct84 - pct16) / 2`.
    pub fn get_sigma(&self, k: f64, round_up: bool) -> f64 {
        let median = self.get_pct(50.0, round_up);
        let spread = (self.get_pct(84.0, round_up) - self.get_pct(16.0, round_up)) / 2.0;
        median + k * spread
    }

    /// 256-entry equalization table: entry `j` is the data number below
    /// which `j/255` of the samples fall, so each step covers
    /// `good_pix/255` cumulative samples.
    pub fn eq_table(&self) -> [f64; 256] {
        let mut tbl = [self.hist_max; 256];
        tbl[0] = self.hist_min;
        if self.good_pix == 0 {
            return tbl;
        }

        let step = self.good_pix as f64 / 255.0;
        let mut sum = 0u64;
        let mut j = 1usize;
        for (i, &c) in self.counts.iter().enumerate() {
            sum += c as u64;
            while j < 256 && sum as f64 >= j as f64 * step {
                tbl[j] = (i + 1) as f64 * self.bin_size + self.hist_min;
                j += 1;
            }
        }
        tbl[255] = self.hist_max;
        tbl
    }

    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }

    pub fn hist_min(&self) -> f64 {
        self.hist_min
    }

    pub fn hist_max(&self) -> f64 {
        self.hist_max
    }

    /// True minimum over the non-blank samples.
    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    /// True maximum over the non-blank samples.
    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    /// Number of non-blank samples.
    pub fn good_pix(&self) -> u64 {
        self.good_pix
    }

    /// Samples that fell below/above the binning range on the final pass.
    pub fn tail_counts(&self) -> (u64, u64) {
        (self.underflow, self.overflow)
    }

    /// The frequency table (4097 slots).
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}

/// Lowest bin index at which the cumulative count from the bottom reaches
/// `limit`.
fn cumulative_index_from_low(counts: &[u32], limit: f64) -> usize {
    let mut sum = 0u64;
    for (i, &c) in counts.iter().enumerate() {
        sum += c as u64;
        if sum as f64 >= limit {
            return i;
        }
    }
    counts.len() - 1
}

/// Highest bin index at which the cumulative count from the top reaches
/// `limit`.
fn cumulative_index_from_high(counts: &[u32], limit: f64) -> usize {
    let mut sum = 0u64;
    for (i, &c) in counts.iter().enumerate().rev() {
        sum += c as u64;
        if sum as f64 >= limit {
            return i;
        }
    }
    0
}

// ── Tests ──
