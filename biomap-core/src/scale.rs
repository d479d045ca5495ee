//! Normalization boundaries for choropleth fills and marker colors.
//!
//! Continuous scales map a value into `[0, 1]` between `vmin` and `vmax`, linearly or on a
//! log axis. Discretized scales split `[0, nice_max]` into equal-width buckets; they color
//! the value-driven marker layers.

use crate::error::{BiomapError, BiomapResult};
use crate::types::ScaleKind;

/// Fallback range when the filtered distribution has no usable maximum.
pub const DEFAULT_VMIN: f64 = 1.0;
pub const DEFAULT_VMAX: f64 = 10.0;

/// Smallest upper edge of a discretized scale; an all-zero subset would otherwise
/// collapse every edge onto 0.
pub const MIN_BUCKET_SPAN: f64 = 1.0;

/// Bucket count used by marker layers unless configured otherwise.
pub const DEFAULT_BUCKETS: usize = 5;

/// Derived normalization boundaries. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleBoundaries {
    Continuous { kind: ScaleKind, vmin: f64, vmax: f64 },
    Discrete { edges: Vec<f64> },
}

impl ScaleBoundaries {
    pub fn vmin(&self) -> f64 {
        match self {
            ScaleBoundaries::Continuous { vmin, .. } => *vmin,
            ScaleBoundaries::Discrete { edges } => edges.first().copied().unwrap_or(0.0),
        }
    }

    pub fn vmax(&self) -> f64 {
        match self {
            ScaleBoundaries::Continuous { vmax, .. } => *vmax,
            ScaleBoundaries::Discrete { edges } => edges.last().copied().unwrap_or(0.0),
        }
    }

    pub fn edges(&self) -> Option<&[f64]> {
        match self {
            ScaleBoundaries::Discrete { edges } => Some(edges),
            ScaleBoundaries::Continuous { .. } => None,
        }
    }

    pub fn is_logarithmic(&self) -> bool {
        matches!(
            self,
            ScaleBoundaries::Continuous { kind: ScaleKind::Logarithmic, .. }
        )
    }

    /// Map a value to `[0, 1]` for colormap lookup.
    ///
    /// Out-of-range values clamp to the ends. A degenerate span (`vmin == vmax`) maps
    /// everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        match self {
            ScaleBoundaries::Continuous { kind: ScaleKind::Linear, vmin, vmax } => {
                if vmax <= vmin {
                    return 0.0;
                }
                ((value - vmin) / (vmax - vmin)).clamp(0.0, 1.0)
            }
            ScaleBoundaries::Continuous { kind: ScaleKind::Logarithmic, vmin, vmax } => {
                if value <= 0.0 || *vmin <= 0.0 || vmax <= vmin {
                    return 0.0;
                }
                ((value.ln() - vmin.ln()) / (vmax.ln() - vmin.ln())).clamp(0.0, 1.0)
            }
            ScaleBoundaries::Discrete { edges } => {
                let regions = edges.len().saturating_sub(1);
                match regions {
                    0 => 0.0,
                    1 => 0.5,
                    _ => {
                        let bin = edges
                            .partition_point(|edge| *edge <= value)
                            .saturating_sub(1)
                            .min(regions - 1);
                        bin as f64 / (regions - 1) as f64
                    }
                }
            }
        }
    }

    /// Tick positions for a colorbar.
    pub fn ticks(&self, desired: usize) -> Vec<f64> {
        match self {
            ScaleBoundaries::Discrete { edges } => edges.clone(),
            ScaleBoundaries::Continuous { kind: ScaleKind::Linear, vmin, vmax } => {
                nice_ticks(*vmin, *vmax, desired)
            }
            ScaleBoundaries::Continuous { kind: ScaleKind::Logarithmic, vmin, vmax } => {
                let mut ticks = Vec::new();
                if *vmin > 0.0 && vmax >= vmin {
                    let mut exp = vmin.log10().ceil() as i32;
                    while 10f64.powi(exp) <= *vmax {
                        ticks.push(10f64.powi(exp));
                        exp += 1;
                    }
                }
                if ticks.is_empty() {
                    ticks = vec![*vmin, *vmax];
                }
                ticks
            }
        }
    }
}

/// How boundaries are derived from a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    Continuous(ScaleKind),
    Discretized { buckets: usize },
}

/// Derives [`ScaleBoundaries`] from the values of the selected region.
#[derive(Debug, Clone)]
pub struct ScaleBuilder {
    mode: ScaleMode,
    context: String,
}

impl ScaleBuilder {
    pub fn continuous(kind: ScaleKind) -> Self {
        Self { mode: ScaleMode::Continuous(kind), context: String::from("scale") }
    }

    pub fn discretized(buckets: usize) -> Self {
        Self { mode: ScaleMode::Discretized { buckets }, context: String::from("scale") }
    }

    /// Name used in error messages, usually the dataset or unit table.
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = context.into();
        self
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    /// Boundaries for `values`. An empty or all-NaN input falls back to the default range.
    pub fn compute(&self, values: &[f64]) -> BiomapResult<ScaleBoundaries> {
        self.compute_or_global(values, &[])
    }

    /// Boundaries for `values`, substituting `global` when `values` has no usable maximum,
    /// and the default range when neither does.
    pub fn compute_or_global(&self, values: &[f64], global: &[f64]) -> BiomapResult<ScaleBoundaries> {
        let chosen = if finite_max(values).is_some() { values } else { global };
        let max = finite_max(chosen);

        match self.mode {
            ScaleMode::Continuous(kind) => {
                let Some(vmax) = max else {
                    log::debug!("{}: no values in selection, using default range", self.context);
                    return Ok(default_boundaries(kind));
                };
                match kind {
                    ScaleKind::Linear => Ok(ScaleBoundaries::Continuous { kind, vmin: 0.0, vmax }),
                    ScaleKind::Logarithmic => {
                        let vmin = finite_min(chosen).unwrap_or(vmax);
                        if vmin <= 0.0 {
                            return Err(BiomapError::invalid_scale(
                                &self.context,
                                format!("logarithmic scale needs a positive minimum, got {}", vmin),
                            ));
                        }
                        Ok(ScaleBoundaries::Continuous { kind, vmin, vmax })
                    }
                }
            }
            ScaleMode::Discretized { buckets } => {
                if buckets < 2 {
                    return Err(BiomapError::invalid_scale(
                        &self.context,
                        format!("discretized scale needs at least 2 edges, got {}", buckets),
                    ));
                }
                let upper = nice_upper_bound(max.unwrap_or(DEFAULT_VMAX));
                Ok(ScaleBoundaries::Discrete { edges: linspace(0.0, upper, buckets) })
            }
        }
    }
}

/// Convenience entry point: continuous boundaries, or discretized ones when
/// `bucket_count` is given.
pub fn compute(
    values: &[f64],
    kind: ScaleKind,
    bucket_count: Option<usize>,
) -> BiomapResult<ScaleBoundaries> {
    match bucket_count {
        Some(buckets) => ScaleBuilder::discretized(buckets).compute(values),
        None => ScaleBuilder::continuous(kind).compute(values),
    }
}

fn default_boundaries(kind: ScaleKind) -> ScaleBoundaries {
    match kind {
        ScaleKind::Linear => ScaleBoundaries::Continuous { kind, vmin: 0.0, vmax: DEFAULT_VMAX },
        ScaleKind::Logarithmic => ScaleBoundaries::Continuous {
            kind,
            vmin: DEFAULT_VMIN,
            vmax: DEFAULT_VMAX,
        },
    }
}

fn finite_max(values: &[f64]) -> Option<f64> {
    values.iter().copied().filter(|v| v.is_finite()).reduce(f64::max)
}

fn finite_min(values: &[f64]) -> Option<f64> {
    values.iter().copied().filter(|v| v.is_finite()).reduce(f64::min)
}

/// Round `max` up to two significant digits: 14_257 becomes 15_000, 100 stays 100.
///
/// Digits past `f64::DIGITS` are representation error and do not cause a round-up, so
/// `0.1 + 0.2` gives 0.3. Non-positive or non-finite input yields [`MIN_BUCKET_SPAN`].
pub fn nice_upper_bound(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return MIN_BUCKET_SPAN;
    }
    // Scientific form at the precision f64 guarantees, e.g. "1.42570000000000e4"
    let sci = format!("{:.*e}", f64::DIGITS as usize - 1, max);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return max;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return max;
    };
    let digits: Vec<u32> = mantissa.chars().filter_map(|c| c.to_digit(10)).collect();
    let lead = digits.first().copied().unwrap_or(0);
    let second = digits.get(1).copied().unwrap_or(0);
    let mut head = lead * 10 + second;
    if digits.iter().skip(2).any(|&d| d != 0) {
        head += 1;
    }
    let shift = exponent - 1;
    if shift >= 0 {
        head as f64 * 10f64.powi(shift)
    } else {
        head as f64 / 10f64.powi(-shift)
    }
}

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let div = (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + (stop - start) * i as f64 / div).collect();
            out[n - 1] = stop;
            out
        }
    }
}

// Round a length to a "nice" number: 1, 2, or 5 × 10^k
fn nice_round_length(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    let exp = x.log10().floor();
    let base = 10f64.powf(exp);
    let mant = x / base;
    let nice = if mant <= 1.0 {
        1.0
    } else if mant <= 2.0 {
        2.0
    } else if mant <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * base
}

/// Tick values at multiples of a nice step inside `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, desired: usize) -> Vec<f64> {
    if !(max > min) || desired == 0 {
        return vec![min];
    }
    let step = nice_round_length((max - min) / desired as f64);
    let mut ticks = Vec::new();
    let mut k = (min / step).ceil();
    while k * step <= max + step * 1e-9 {
        ticks.push(k * step);
        k += 1.0;
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_floor_is_zero() {
        let scale = compute(&[250.0, 40.0, 900.0], ScaleKind::Linear, None).unwrap();
        assert_eq!(
            scale,
            ScaleBoundaries::Continuous { kind: ScaleKind::Linear, vmin: 0.0, vmax: 900.0 }
        );
        assert_eq!(scale.normalize(450.0), 0.5);
        assert_eq!(scale.normalize(2000.0), 1.0);
    }

    #[test]
    fn test_log_bounds_follow_distribution() {
        let scale = compute(&[10.0, 1000.0, 100.0], ScaleKind::Logarithmic, None).unwrap();
        assert_eq!(scale.vmin(), 10.0);
        assert_eq!(scale.vmax(), 1000.0);
        assert!((scale.normalize(100.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_log_rejects_non_positive_minimum() {
        let err = ScaleBuilder::continuous(ScaleKind::Logarithmic)
            .with_context("palma")
            .compute(&[0.0, 5.0])
            .unwrap_err();
        assert!(matches!(err, BiomapError::InvalidScale { ref context, .. } if context == "palma"));
        assert!(compute(&[-3.0, 5.0], ScaleKind::Logarithmic, None).is_err());
    }

    #[test]
    fn test_empty_selection_uses_default_range() {
        let linear = compute(&[], ScaleKind::Linear, None).unwrap();
        assert_eq!((linear.vmin(), linear.vmax()), (0.0, DEFAULT_VMAX));
        let log = compute(&[f64::NAN], ScaleKind::Logarithmic, None).unwrap();
        assert_eq!((log.vmin(), log.vmax()), (DEFAULT_VMIN, DEFAULT_VMAX));
    }

    #[test]
    fn test_global_fallback_for_empty_subset() {
        let builder = ScaleBuilder::discretized(5);
        let scale = builder.compute_or_global(&[], &[3.0, 80.0]).unwrap();
        assert_eq!(scale.vmax(), 80.0);
    }

    #[test]
    fn test_nice_upper_bound() {
        assert_eq!(nice_upper_bound(14257.0), 15000.0);
        assert_eq!(nice_upper_bound(100.0), 100.0);
        assert_eq!(nice_upper_bound(120.0), 120.0);
        assert_eq!(nice_upper_bound(121.0), 130.0);
        assert_eq!(nice_upper_bound(99.5), 100.0);
        assert_eq!(nice_upper_bound(5.0), 5.0);
        assert_eq!(nice_upper_bound(0.5), 0.5);
        assert_eq!(nice_upper_bound(0.0), MIN_BUCKET_SPAN);
    }

    #[test]
    fn test_discretized_needs_two_edges() {
        for buckets in [0, 1] {
            let result = ScaleBuilder::discretized(buckets).with_context("consumo").compute(&[10.0]);
            assert!(matches!(result, Err(BiomapError::InvalidScale { .. })));
        }
        assert_eq!(ScaleBuilder::discretized(2).compute(&[10.0]).unwrap().edges().unwrap(), &[0.0, 10.0]);
    }

    #[test]
    fn test_nice_upper_bound_ignores_float_noise() {
        assert_eq!(nice_upper_bound(0.1 + 0.2), 0.3);
        assert_eq!(nice_upper_bound(12_000.000_000_000_002), 12_000.0);
        assert_eq!(nice_upper_bound(19_500.0), 20_000.0);
        // Digits inside f64 precision still round up
        assert_eq!(nice_upper_bound(12_000.000_01), 13_000.0);
    }

    #[test]
    fn test_discretized_three_region_example() {
        let scale = compute(&[5.0, 40.0, 14257.0], ScaleKind::Linear, Some(5)).unwrap();
        assert_eq!(scale.edges().unwrap(), linspace(0.0, 15000.0, 5).as_slice());
        assert_eq!(scale.edges().unwrap(), &[0.0, 3750.0, 7500.0, 11250.0, 15000.0]);
    }

    #[test]
    fn test_all_zero_subset_keeps_a_span() {
        let scale = ScaleBuilder::discretized(5).compute_or_global(&[0.0, 0.0], &[0.0, 0.0, 100.0]).unwrap();
        let edges = scale.edges().unwrap();
        assert_eq!(edges, &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(scale.normalize(0.0), 0.0);
    }

    #[test]
    fn test_discrete_normalize_buckets() {
        let scale = ScaleBoundaries::Discrete { edges: vec![0.0, 25.0, 50.0, 75.0, 100.0] };
        assert_eq!(scale.normalize(0.0), 0.0);
        assert_eq!(scale.normalize(30.0), 1.0 / 3.0);
        assert_eq!(scale.normalize(60.0), 2.0 / 3.0);
        assert_eq!(scale.normalize(99.0), 1.0);
        assert_eq!(scale.normalize(100.0), 1.0);
        assert_eq!(scale.normalize(-5.0), 0.0);
    }

    #[test]
    fn test_bucket_count_below_two_is_invalid() {
        assert!(compute(&[1.0, 2.0], ScaleKind::Linear, Some(1)).is_err());
    }

    #[test]
    fn test_ticks() {
        let linear = ScaleBoundaries::Continuous { kind: ScaleKind::Linear, vmin: 0.0, vmax: 900.0 };
        assert_eq!(linear.ticks(5), vec![0.0, 200.0, 400.0, 600.0, 800.0]);
        let log = ScaleBoundaries::Continuous { kind: ScaleKind::Logarithmic, vmin: 5.0, vmax: 5000.0 };
        assert_eq!(log.ticks(5), vec![10.0, 100.0, 1000.0]);
    }
}
