// Run detection over density profiles.
//
// Column and line detection disagree on width comparison and on what happens
// to a run still open at the end of the profile, so both are policy knobs.

use crate::layout::types::Region;
use serde::{Deserialize, Serialize};

/// How a run's width is compared against `min_width`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthRule {
    /// keep iff `len > min_width`
    Strict,
    /// keep iff `len >= min_width`
    Inclusive,
}

/// What to do with a run that is still open when the profile ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingRun {
    Discard,
    CloseAtEnd,
}

/// Result when no run qualifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyFallback {
    Nothing,
    /// One region covering the whole axis
    WholeAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPolicy {
    /// An index is active iff its count is strictly greater than this
    pub threshold: f64,
    pub min_width: usize,
    pub width_rule: WidthRule,
    pub trailing: TrailingRun,
    pub fallback: EmptyFallback,
}

impl RegionPolicy {
    /// Column detection defaults
    pub fn columns() -> Self {
        Self {
            threshold: 1.0,
            min_width: 30,
            width_rule: WidthRule::Inclusive,
            trailing: TrailingRun::CloseAtEnd,
            fallback: EmptyFallback::WholeAxis,
        }
    }

    /// Text line detection defaults
    pub fn lines() -> Self {
        Self {
            threshold: 0.0,
            min_width: 5,
            width_rule: WidthRule::Strict,
            trailing: TrailingRun::Discard,
            fallback: EmptyFallback::Nothing,
        }
    }

    /// Every run above `threshold` counts, including one touching the end.
    pub fn any_run(threshold: f64) -> Self {
        Self {
            threshold,
            min_width: 1,
            width_rule: WidthRule::Inclusive,
            trailing: TrailingRun::CloseAtEnd,
            fallback: EmptyFallback::Nothing,
        }
    }

    fn accepts_width(&self, len: usize) -> bool {
        match self.width_rule {
            WidthRule::Strict => len > self.min_width,
            WidthRule::Inclusive => len >= self.min_width,
        }
    }
}

/// Maximal runs of `profile[i] > threshold`, filtered by width.
///
/// Output regions are disjoint, strictly increasing, and lie in `[0, len)`.
pub fn find_regions(profile: &[u32], policy: &RegionPolicy) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, &count) in profile.iter().enumerate() {
        let active = count as f64 > policy.threshold;
        match (active, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                run_start = None;
                if policy.accepts_width(i - start) {
                    regions.extend(Region::new(start, i));
                }
            }
            _ => {}
        }
    }

    if let (Some(start), TrailingRun::CloseAtEnd) = (run_start, policy.trailing) {
        if policy.accepts_width(profile.len() - start) {
            regions.extend(Region::new(start, profile.len()));
        }
    }

    if regions.is_empty() && policy.fallback == EmptyFallback::WholeAxis {
        tracing::debug!("No runs above {}, using whole axis", policy.threshold);
        regions.extend(Region::new(0, profile.len()));
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(min_width: usize, width_rule: WidthRule, trailing: TrailingRun) -> RegionPolicy {
        RegionPolicy {
            threshold: 0.0,
            min_width,
            width_rule,
            trailing,
            fallback: EmptyFallback::Nothing,
        }
    }

    fn r(start: usize, end: usize) -> Region {
        Region::new(start, end).unwrap()
    }

    #[test]
    fn test_basic_runs() {
        let profile = [0, 3, 4, 0, 0, 1, 1, 1, 0];
        let regions = find_regions(&profile, &policy(1, WidthRule::Inclusive, TrailingRun::Discard));
        assert_eq!(regions, vec![r(1, 3), r(5, 8)]);
    }

    #[test]
    fn test_width_rule_strict_vs_inclusive() {
        // runs of width 2 and 3
        let profile = [1, 1, 0, 1, 1, 1, 0];
        let strict = find_regions(&profile, &policy(2, WidthRule::Strict, TrailingRun::Discard));
        assert_eq!(strict, vec![r(3, 6)]);
        let inclusive =
            find_regions(&profile, &policy(2, WidthRule::Inclusive, TrailingRun::Discard));
        assert_eq!(inclusive, vec![r(0, 2), r(3, 6)]);
    }

    #[test]
    fn test_trailing_run() {
        let profile = [0, 2, 2, 0, 5, 5, 5];
        let discard = find_regions(&profile, &policy(1, WidthRule::Inclusive, TrailingRun::Discard));
        assert_eq!(discard, vec![r(1, 3)]);
        let close = find_regions(&profile, &policy(1, WidthRule::Inclusive, TrailingRun::CloseAtEnd));
        assert_eq!(close, vec![r(1, 3), r(4, 7)]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let profile = [1, 1, 2, 2, 1];
        let p = RegionPolicy {
            threshold: 1.0,
            ..policy(1, WidthRule::Inclusive, TrailingRun::CloseAtEnd)
        };
        assert_eq!(find_regions(&profile, &p), vec![r(2, 4)]);
    }

    #[test]
    fn test_fallback_is_opt_in() {
        let blank = [0u32; 12];
        let none = find_regions(&blank, &RegionPolicy::lines());
        assert!(none.is_empty());

        let whole = find_regions(&blank, &RegionPolicy::columns());
        assert_eq!(whole, vec![r(0, 12)]);

        // no region can exist on an empty axis, fallback or not
        assert!(find_regions(&[], &RegionPolicy::columns()).is_empty());
    }

    #[test]
    fn test_regions_bounded_disjoint_increasing() {
        let profiles: Vec<Vec<u32>> = vec![
            vec![3, 0, 3, 3, 0, 0, 7, 7, 7, 7],
            vec![0, 0, 0, 9],
            vec![9, 9, 9, 9],
            vec![1, 0, 1, 0, 1, 0, 1],
        ];
        let policies = [
            RegionPolicy::columns(),
            RegionPolicy::lines(),
            RegionPolicy::any_run(0.0),
            policy(0, WidthRule::Strict, TrailingRun::CloseAtEnd),
        ];

        for profile in &profiles {
            for p in &policies {
                let regions = find_regions(profile, p);
                for region in &regions {
                    assert!(region.start < region.end);
                    assert!(region.end <= profile.len());
                }
                for pair in regions.windows(2) {
                    assert!(pair[0].end <= pair[1].start);
                    assert!(pair[0].start < pair[1].start);
                }
            }
        }
    }
}
