//! Keyframe string encoding
//!
//! Two encoders turn an axis series into sparse `index:(value)` pairs:
//!
//! - [`encode_keyframes`] (the Deforum schedule form): values near zero are
//!   snapped to zero, and a sample is dropped only when both neighbours hold
//!   the same value. The first and last samples are always kept.
//! - [`encode_raw_frames`]: a sample is kept whenever it differs from the last
//!   kept one. No snapping, no lookahead.
//!
//! Encoders produce [`Keyframe`] lists; text is produced separately by
//! [`format_keyframes`] and [`format_raw_frames`].

use crate::error::ExportError;

/// Magnitude below which a value is written as exactly zero
pub const ZERO_EPSILON: f64 = 1e-5;

/// Relative tolerance for "same value" comparisons
pub const REL_TOLERANCE: f64 = 1e-9;

/// Absolute tolerance for "same value" comparisons
pub const ABS_TOLERANCE: f64 = 0.0;

/// A single explicit sample in an encoded series
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub index: usize,
    pub value: f64,
}

impl Keyframe {
    pub fn new(index: usize, value: f64) -> Self {
        Self { index, value }
    }
}

/// Replace values within [`ZERO_EPSILON`] of zero by zero
pub fn snap_zero(value: f64) -> f64 {
    if value.abs() > ZERO_EPSILON {
        value
    } else {
        0.0
    }
}

/// Relative + absolute closeness test used by every encoder and check
pub fn is_close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let tolerance = (REL_TOLERANCE * a.abs().max(b.abs())).max(ABS_TOLERANCE);
    (a - b).abs() <= tolerance
}

/// Sparse keyframes for a Deforum schedule string
///
/// Index `i` is omitted only when both `i - 1` and `i + 1` exist and hold the
/// same (zero-snapped) value, so runs collapse to their first and last member.
pub fn encode_keyframes(series: &[f64]) -> Vec<Keyframe> {
    let mut keyframes = Vec::new();
    for (i, &raw) in series.iter().enumerate() {
        let value = snap_zero(raw);
        let last_is_same = i > 0 && is_close(value, snap_zero(series[i - 1]));
        let next_is_same = series
            .get(i + 1)
            .is_some_and(|&next| is_close(value, snap_zero(next)));
        if !(last_is_same && next_is_same) {
            keyframes.push(Keyframe::new(i, value));
        }
    }
    keyframes
}

/// Run-start keyframes for exact replay
///
/// Keeps a sample whenever it is not close to the previously kept value.
pub fn encode_raw_frames(series: &[f64]) -> Vec<Keyframe> {
    let mut keyframes: Vec<Keyframe> = Vec::new();
    for (i, &value) in series.iter().enumerate() {
        let repeat = keyframes
            .last()
            .is_some_and(|last| is_close(value, last.value));
        if !repeat {
            keyframes.push(Keyframe::new(i, value));
        }
    }
    keyframes
}

/// Render schedule keyframes, each pair followed by a comma
///
/// Zero renders as `0`; other values use the shortest round-trip form.
pub fn format_keyframes(keyframes: &[Keyframe]) -> String {
    keyframes
        .iter()
        .map(|k| {
            let value = if k.value == 0.0 {
                "0".to_string()
            } else {
                format_float(k.value)
            };
            format!("{}:({}),", k.index, value)
        })
        .collect()
}

/// Render raw-frame keyframes, comma separated with no trailing comma
pub fn format_raw_frames(keyframes: &[Keyframe]) -> String {
    keyframes
        .iter()
        .map(|k| format!("{}:({})", k.index, format_float(k.value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode a series straight to its Deforum schedule string
pub fn keyframe_string(series: &[f64]) -> String {
    format_keyframes(&encode_keyframes(series))
}

/// Encode a series straight to its raw-frames string
pub fn raw_frames_string(series: &[f64]) -> String {
    format_raw_frames(&encode_raw_frames(series))
}

/// Shortest round-trip float text with a two-digit signed exponent
///
/// Matches the notation Deforum schedules are usually written in:
/// `5.0`, `-0.25`, `1e-06`, `1.5e+16`.
pub fn format_float(value: f64) -> String {
    let text = format!("{value:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Parse `index:(value)` pairs back out of an encoded string
///
/// Accepts both the schedule form (trailing comma) and the raw-frames form.
pub fn parse_keyframes(text: &str) -> Result<Vec<Keyframe>, ExportError> {
    let mut keyframes: Vec<Keyframe> = Vec::new();
    for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let malformed = || ExportError::MalformedKeyframes(format!("bad pair '{pair}'"));

        let (index, value) = pair.split_once(':').ok_or_else(malformed)?;
        let index: usize = index.trim().parse().map_err(|_| malformed())?;
        let value: f64 = value
            .trim()
            .strip_prefix('(')
            .and_then(|v| v.strip_suffix(')'))
            .ok_or_else(malformed)?
            .trim()
            .parse()
            .map_err(|_| malformed())?;

        if keyframes.last().is_some_and(|last| last.index >= index) {
            return Err(ExportError::MalformedKeyframes(format!(
                "index {index} is not increasing"
            )));
        }
        keyframes.push(Keyframe::new(index, value));
    }
    Ok(keyframes)
}

/// Rebuild a series of `len` samples by forward-filling explicit keyframes
///
/// Indices before the first keyframe take its value.
pub fn decode_keyframes(text: &str, len: usize) -> Result<Vec<f64>, ExportError> {
    let keyframes = parse_keyframes(text)?;
    let Some(first) = keyframes.first() else {
        if len == 0 {
            return Ok(Vec::new());
        }
        return Err(ExportError::MalformedKeyframes(format!(
            "no keyframes for {len} samples"
        )));
    };
    let last_index = keyframes.last().map_or(0, |k| k.index);
    if last_index >= len {
        return Err(ExportError::MalformedKeyframes(format!(
            "index {last_index} out of range for {len} samples"
        )));
    }

    let mut values = Vec::with_capacity(len);
    let mut current = first.value;
    let mut next = keyframes.iter().peekable();
    for i in 0..len {
        while let Some(k) = next.next_if(|k| k.index <= i) {
            current = k.value;
        }
        values.push(current);
    }
    Ok(values)
}

/// First sample the schedule `text` does not faithfully carry, if any
///
/// Explicit keyframes must match their sample. An omitted sample must match
/// both neighbours, which is all [`encode_keyframes`] promises: a slow drift
/// can collapse into one run whose interior is never compared to its ends.
pub fn schedule_mismatch(series: &[f64], text: &str) -> Result<Option<usize>, ExportError> {
    let decoded = decode_keyframes(text, series.len())?;
    let keyframes = parse_keyframes(text)?;
    let mut explicit = keyframes.iter().map(|k| k.index).peekable();

    for (i, (&raw, &value)) in series.iter().zip(&decoded).enumerate() {
        let sample = snap_zero(raw);
        let carried = if explicit.next_if_eq(&i).is_some() {
            is_close(sample, value)
        } else {
            i > 0
                && is_close(sample, snap_zero(series[i - 1]))
                && series
                    .get(i + 1)
                    .is_some_and(|&next| is_close(sample, snap_zero(next)))
        };
        if !carried {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(keyframes: &[Keyframe]) -> Vec<usize> {
        keyframes.iter().map(|k| k.index).collect()
    }

    #[test]
    fn test_run_collapse() {
        assert_eq!(keyframe_string(&[5.0, 5.0, 5.0, 5.0]), "0:(5.0),3:(5.0),");
    }

    #[test]
    fn test_boundaries_always_emitted() {
        let series = [1.0, 1.0, 2.0, 2.0, 2.0, 2.0];
        let keyframes = encode_keyframes(&series);
        assert_eq!(keyframes.first().unwrap().index, 0);
        assert_eq!(keyframes.last().unwrap().index, series.len() - 1);
        assert_eq!(indices(&keyframes), vec![0, 1, 2, 5]);
    }

    #[test]
    fn test_single_and_pair_series() {
        assert_eq!(keyframe_string(&[2.5]), "0:(2.5),");
        assert_eq!(keyframe_string(&[2.5, 2.5]), "0:(2.5),1:(2.5),");
        assert_eq!(keyframe_string(&[]), "");
    }

    #[test]
    fn test_zero_snap() {
        assert_eq!(keyframe_string(&[3e-6]), "0:(0),");
        assert_eq!(keyframe_string(&[-1e-5]), "0:(0),");
        assert_eq!(keyframe_string(&[0.0, -0.0]), "0:(0),1:(0),");
        assert_eq!(snap_zero(2e-5), 2e-5);
    }

    #[test]
    fn test_near_zero_jitter_collapses() {
        let series = [1e-7, -3e-6, 0.0, 8e-6, -1e-9];
        assert_eq!(keyframe_string(&series), "0:(0),4:(0),");
    }

    #[test]
    fn test_changes_keep_both_sides() {
        let series = [0.0, 0.0, 0.0, 1.5, 1.5, 1.5, 0.0];
        assert_eq!(
            keyframe_string(&series),
            "0:(0),2:(0),3:(1.5),5:(1.5),6:(0),"
        );
    }

    #[test]
    fn test_isolated_spike_is_kept() {
        let series = [1.0, 7.0, 1.0];
        assert_eq!(indices(&encode_keyframes(&series)), vec![0, 1, 2]);
    }

    #[test]
    fn test_closeness_tolerance() {
        assert!(is_close(1.0, 1.0 + 1e-12));
        assert!(!is_close(1.0, 1.0 + 1e-6));
        assert!(is_close(0.0, 0.0));
        assert!(!is_close(0.0, 1e-300));
        let series = [10.0, 10.0 + 1e-10, 10.0];
        assert_eq!(indices(&encode_keyframes(&series)), vec![0, 2]);
    }

    #[test]
    fn test_raw_frames_no_snapping() {
        assert_eq!(raw_frames_string(&[1e-6]), "0:(1e-06)");
        assert_eq!(raw_frames_string(&[0.0, 1e-6, 1e-6]), "0:(0.0),1:(1e-06)");
    }

    #[test]
    fn test_raw_frames_run_starts_only() {
        let series = [2.0, 2.0, 2.0, 3.0, 3.0, 2.0];
        assert_eq!(raw_frames_string(&series), "0:(2.0),3:(3.0),5:(2.0)");
        assert_eq!(raw_frames_string(&[]), "");
    }

    #[test]
    fn test_raw_frames_compare_to_last_emitted() {
        // Each step is within tolerance of its neighbour but the drift is not
        let step = 0.9e-9;
        let series = [1.0, 1.0 + step, 1.0 + 2.0 * step, 1.0 + 3.0 * step];
        let keyframes = encode_raw_frames(&series);
        assert_eq!(indices(&keyframes), vec![0, 2]);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(5.0), "5.0");
        assert_eq!(format_float(-0.25), "-0.25");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(-1.5e-7), "-1.5e-07");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.25e123), "1.25e+123");
    }

    #[test]
    fn test_parse_keyframes() {
        let parsed = parse_keyframes("0:(0), 4:(-2.5),9:(1e-06),").unwrap();
        assert_eq!(
            parsed,
            vec![
                Keyframe::new(0, 0.0),
                Keyframe::new(4, -2.5),
                Keyframe::new(9, 1e-6)
            ]
        );
    }

    #[test]
    fn test_parse_keyframes_malformed() {
        for text in ["0:5.0,", "x:(1.0),", "0:(abc),", "3", "2:(1.0),1:(1.0)"] {
            assert!(
                matches!(parse_keyframes(text), Err(ExportError::MalformedKeyframes(_))),
                "accepted {text}"
            );
        }
    }

    #[test]
    fn test_decode_forward_fill() {
        let values = decode_keyframes("0:(5.0),3:(5.0),", 4).unwrap();
        assert_eq!(values, vec![5.0; 4]);

        let values = decode_keyframes("1:(2.0),3:(4.0)", 5).unwrap();
        assert_eq!(values, vec![2.0, 2.0, 2.0, 4.0, 4.0]);
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        assert!(decode_keyframes("0:(1.0),7:(1.0),", 4).is_err());
        assert!(decode_keyframes("", 3).is_err());
        assert_eq!(decode_keyframes("", 0).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn test_round_trip_reconstruction() {
        let series = [
            0.0, 0.0, 3e-6, 1.25, 1.25, 1.25, -4.0, 2.0, 2.0, 9e-6, 0.0, 17.5, 17.5,
        ];
        let text = keyframe_string(&series);
        let decoded = decode_keyframes(&text, series.len()).unwrap();
        for (i, (&original, &value)) in series.iter().zip(&decoded).enumerate() {
            assert!(
                is_close(snap_zero(original), value),
                "index {i}: {original} decoded as {value}"
            );
        }
    }

    #[test]
    fn test_slow_drift_is_not_a_mismatch() {
        let series: Vec<f64> = (0..6).map(|i| 1.0 + 0.9e-9 * i as f64).collect();
        let text = keyframe_string(&series);
        assert_eq!(indices(&parse_keyframes(&text).unwrap()), vec![0, 5]);

        // Interior samples drift away from the decoded run value
        let decoded = decode_keyframes(&text, series.len()).unwrap();
        assert!(!is_close(series[3], decoded[3]));
        assert_eq!(schedule_mismatch(&series, &text).unwrap(), None);
    }

    #[test]
    fn test_schedule_mismatch_reports_first_bad_sample() {
        let series = [1.0, 2.0, 3.0, 3.0];
        assert_eq!(schedule_mismatch(&series, &keyframe_string(&series)).unwrap(), None);
        // Omitted sample that differs from its neighbours
        assert_eq!(
            schedule_mismatch(&series, "0:(1.0),2:(3.0),3:(3.0),").unwrap(),
            Some(1)
        );
        // Explicit keyframe with the wrong value
        assert_eq!(
            schedule_mismatch(&series, "0:(1.0),1:(2.0),2:(3.5),3:(3.0),").unwrap(),
            Some(2)
        );
        assert!(schedule_mismatch(&series, "0:(1.0),9:(1.0),").is_err());
    }

    #[test]
    fn test_raw_frames_round_trip_is_exact() {
        let series = [0.5, 0.5, 1e-6, 1e-6, -3.0, 0.5];
        let decoded = decode_keyframes(&raw_frames_string(&series), series.len()).unwrap();
        assert_eq!(decoded, series.to_vec());
    }
}
