//! Pattern primitives over aligned per-bar series.
//!
//! Every function here is causal: the value at bar `i` reads only bars `0..=i`.
//! Flags are three-valued: `None` while an input is still warming up.

/// `value >= mult * average`, indeterminate while the average is NaN or not positive.
pub fn volume_multiple(volumes: &[f64], average: &[f64], mult: f64) -> Vec<Option<bool>> {
    volumes
        .iter()
        .zip(average)
        .map(|(&v, &avg)| {
            if avg.is_nan() || avg <= 0.0 || v.is_nan() {
                None
            } else {
                Some(v >= mult * avg)
            }
        })
        .collect()
}

/// Forward-fill a level from the bars where `flags` is set.
///
/// The level at bar `i` is `levels[j]` for the most recent `j <= i` with
/// `flags[j] == Some(true)`; `None` before the first such bar.
pub fn carry_forward(flags: &[Option<bool>], levels: &[f64]) -> Vec<Option<f64>> {
    let mut current = None;
    flags
        .iter()
        .zip(levels)
        .map(|(&flag, &level)| {
            if flag == Some(true) {
                current = Some(level);
            }
            current
        })
        .collect()
}

/// Close of the highest-volume bar among the `lookback` bars before each bar.
///
/// The first bar holding the maximum wins ties. Defined from bar `lookback` on.
pub fn volume_anchor(closes: &[f64], volumes: &[f64], lookback: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut anchors = vec![None; n];
    if lookback == 0 {
        return anchors;
    }

    for i in lookback..n {
        let start = i - lookback;
        let mut best: Option<usize> = None;
        for j in start..i {
            let v = volumes[j];
            if v.is_nan() {
                continue;
            }
            match best {
                Some(b) if volumes[b] >= v => {}
                _ => best = Some(j),
            }
        }
        anchors[i] = best.map(|b| closes[b]).filter(|c| c.is_finite());
    }

    anchors
}

/// `|close / anchor - 1| <= tolerance`, indeterminate without a usable anchor.
pub fn near_anchor(closes: &[f64], anchors: &[Option<f64>], tolerance: f64) -> Vec<Option<bool>> {
    closes
        .iter()
        .zip(anchors)
        .map(|(&close, anchor)| match anchor {
            Some(a) if *a != 0.0 && close.is_finite() => Some((close / a - 1.0).abs() <= tolerance),
            _ => None,
        })
        .collect()
}

/// Number of `Some(true)` flags in the trailing `window` bars, once the window is full.
///
/// Indeterminate flags count as not set.
pub fn trailing_count(flags: &[Option<bool>], window: usize) -> Vec<Option<usize>> {
    let n = flags.len();
    let mut counts = vec![None; n];
    if window == 0 || n < window {
        return counts;
    }

    let hits: Vec<usize> = flags.iter().map(|f| usize::from(*f == Some(true))).collect();
    let mut running: usize = hits[..window - 1].iter().sum();
    for i in (window - 1)..n {
        running += hits[i];
        counts[i] = Some(running);
        running -= hits[i + 1 - window];
    }

    counts
}

/// Whether any flag in the trailing `window` bars (current bar included) is set.
///
/// `None` only when every flag in the window is still indeterminate.
pub fn any_within(flags: &[Option<bool>], window: usize) -> Vec<Option<bool>> {
    (0..flags.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &flags[start..=i];
            if slice.iter().any(|f| *f == Some(true)) {
                Some(true)
            } else if slice.iter().all(Option::is_none) {
                None
            } else {
                Some(false)
            }
        })
        .collect()
}

/// Breakout today with at least one earlier breakout in the `lookback` bars before today.
pub fn rebreakout(breakouts: &[Option<bool>], lookback: usize) -> Vec<Option<bool>> {
    (0..breakouts.len())
        .map(|i| match breakouts[i] {
            Some(true) => {
                let start = i.saturating_sub(lookback);
                Some(breakouts[start..i].iter().any(|f| *f == Some(true)))
            }
            other => other,
        })
        .collect()
}

/// Three-valued conjunction: false wins, then indeterminate, then true.
pub fn all_of(terms: &[Option<bool>]) -> Option<bool> {
    if terms.iter().any(|t| *t == Some(false)) {
        Some(false)
    } else if terms.iter().any(Option::is_none) {
        None
    } else {
        Some(true)
    }
}

/// Compare a series against a threshold, indeterminate where the series is NaN.
pub fn compare(values: &[f64], pred: impl Fn(f64) -> bool) -> Vec<Option<bool>> {
    values
        .iter()
        .map(|&v| if v.is_nan() { None } else { Some(pred(v)) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_multiple_needs_positive_average() {
        let flags = volume_multiple(&[500.0, 500.0, 500.0], &[f64::NAN, 0.0, 100.0], 5.0);
        assert_eq!(flags, vec![None, None, Some(true)]);
    }

    #[test]
    fn carry_forward_holds_until_superseded() {
        let flags = [None, Some(true), Some(false), Some(true), Some(false)];
        let levels = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(
            carry_forward(&flags, &levels),
            vec![None, Some(2.0), Some(2.0), Some(4.0), Some(4.0)]
        );
    }

    #[test]
    fn anchor_excludes_current_bar_and_takes_first_max() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let volumes = [5.0, 9.0, 9.0, 1.0, 100.0];
        let anchors = volume_anchor(&closes, &volumes, 3);
        assert_eq!(anchors[2], None);
        // window [5, 9, 9] -> first max at index 1
        assert_eq!(anchors[3], Some(11.0));
        // window [9, 9, 1] -> index 1 again; today's 100 is not seen
        assert_eq!(anchors[4], Some(11.0));
    }

    #[test]
    fn near_anchor_tolerance() {
        let flags = near_anchor(&[104.0, 106.0, 1.0], &[Some(100.0), Some(100.0), Some(0.0)], 0.05);
        assert_eq!(flags, vec![Some(true), Some(false), None]);
    }

    #[test]
    fn trailing_count_full_windows_only() {
        let flags = [Some(true), None, Some(true), Some(true), Some(false)];
        assert_eq!(
            trailing_count(&flags, 3),
            vec![None, None, Some(2), Some(2), Some(2)]
        );
    }

    #[test]
    fn any_within_includes_today() {
        let flags = [None, Some(false), Some(true), Some(false), Some(false)];
        assert_eq!(
            any_within(&flags, 2),
            vec![None, Some(false), Some(true), Some(true), Some(false)]
        );
    }

    #[test]
    fn rebreakout_requires_prior_breakout() {
        let flags = [Some(true), Some(false), Some(true), Some(true), None];
        assert_eq!(
            rebreakout(&flags, 1),
            vec![Some(false), Some(false), Some(false), Some(true), None]
        );
        assert_eq!(rebreakout(&flags, 3)[2], Some(true));
    }

    #[test]
    fn all_of_is_three_valued() {
        assert_eq!(all_of(&[Some(true), Some(true)]), Some(true));
        assert_eq!(all_of(&[Some(true), None]), None);
        assert_eq!(all_of(&[None, Some(false)]), Some(false));
    }
}
