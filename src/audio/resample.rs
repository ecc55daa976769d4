//! Channel layout and sample-rate conversion utilities.
//!
//! Capture devices deliver interleaved samples while the store keeps them
//! channel-major; output devices want interleaved samples again, possibly
//! with a different channel count and rate.  This module provides those
//! conversions:
//!
//! 1. [`deinterleave`] / [`interleave`]: switch between the two layouts.
//! 2. [`remap_channels`]: fit a clip onto a device's channel count.
//! 3. [`resample`]: linear-interpolation rate conversion.

// ---------------------------------------------------------------------------
// deinterleave / interleave
// ---------------------------------------------------------------------------

/// Split interleaved samples into one `Vec` per channel.
///
/// Trailing samples that do not complete a group are dropped.  `channels ==
/// 0` yields an empty vector.
///
/// ```rust
/// use auo::audio::deinterleave;
///
/// let split = deinterleave(&[0.5, -0.5, 0.2, -0.2], 2); // L R L R
/// assert_eq!(split, vec![vec![0.5, 0.2], vec![-0.5, -0.2]]);
/// ```
pub fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
    match channels {
        0 => Vec::new(),
        1 => vec![samples.to_vec()],
        n => {
            let n = n as usize;
            let mut out = vec![Vec::with_capacity(samples.len() / n); n];
            for group in samples.chunks_exact(n) {
                for (channel, &s) in out.iter_mut().zip(group) {
                    channel.push(s);
                }
            }
            out
        }
    }
}

/// Merge channel-major samples into one interleaved buffer.
///
/// The output length is `channels.len() * shortest_channel_len`.
pub fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let len = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(len * channels.len());
    for i in 0..len {
        for channel in channels {
            out.push(channel[i]);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// remap_channels
// ---------------------------------------------------------------------------

/// Source channel feeding output channel `out` when a clip with `source`
/// channels is played on a device with `target` channels.
///
/// Mono is duplicated onto every output; extra clip channels are dropped;
/// missing ones repeat the last clip channel.
pub fn source_channel(out: usize, source: usize, target: usize) -> usize {
    debug_assert!(source > 0 && out < target);
    out.min(source - 1)
}

/// Rebuild `channels` with exactly `target` channels using
/// [`source_channel`].
pub fn remap_channels(channels: &[Vec<f32>], target: usize) -> Vec<Vec<f32>> {
    if channels.is_empty() {
        return vec![Vec::new(); target];
    }
    (0..target)
        .map(|out| channels[source_channel(out, channels.len(), target)].clone())
        .collect()
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample `samples` from `source_rate` Hz to `target_rate` Hz using
/// linear interpolation.
///
/// * Equal rates return the input unchanged (no interpolation performed).
/// * An empty input or a zero rate yields an empty vector.
///
/// The output length is `ceil(samples.len() * target_rate / source_rate)`.
///
/// ```rust
/// use auo::audio::resample;
///
/// let hi = vec![0.5_f32; 480];
/// let lo = resample(&hi, 48_000, 16_000);
/// assert_eq!(lo.len(), 160);
/// ```
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- deinterleave / interleave -----------------------------------------

    #[test]
    fn deinterleave_mono_is_copy() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(deinterleave(&input, 1), vec![input]);
    }

    #[test]
    fn deinterleave_drops_partial_group() {
        let out = deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(out, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn deinterleave_zero_channels() {
        assert!(deinterleave(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn interleave_restores_device_layout() {
        let input = vec![0.1_f32, -0.1, 0.2, -0.2, 0.3, -0.3];
        let split = deinterleave(&input, 2);
        assert_eq!(interleave(&split), input);
    }

    #[test]
    fn interleave_truncates_to_shortest() {
        let out = interleave(&[vec![1.0, 2.0, 3.0], vec![4.0]]);
        assert_eq!(out, vec![1.0, 4.0]);
    }

    // ---- remap_channels ----------------------------------------------------

    #[test]
    fn mono_is_duplicated_on_stereo_device() {
        let out = remap_channels(&[vec![0.5, 0.25]], 2);
        assert_eq!(out, vec![vec![0.5, 0.25], vec![0.5, 0.25]]);
    }

    #[test]
    fn extra_channels_are_dropped() {
        let out = remap_channels(&[vec![1.0], vec![2.0], vec![3.0]], 2);
        assert_eq!(out, vec![vec![1.0], vec![2.0]]);
    }

    // ---- resample ----------------------------------------------------------

    #[test]
    fn resample_same_rate_is_noop() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        assert_eq!(resample(&input, 44_100, 44_100), input);
    }

    #[test]
    fn resample_empty_input() {
        assert!(resample(&[], 48_000, 44_100).is_empty());
    }

    #[test]
    fn resample_44100_to_48000_output_length() {
        let input = vec![0.0_f32; 44_100];
        let out = resample(&input, 44_100, 48_000);
        assert!(
            out.len().abs_diff(48_000) <= 1,
            "expected ~48000, got {}",
            out.len()
        );
    }

    #[test]
    fn resample_constant_signal_preserves_amplitude() {
        let input = vec![0.5_f32; 441];
        for &s in &resample(&input, 44_100, 48_000) {
            assert!((s - 0.5).abs() < 1e-5, "amplitude drift: {s}");
        }
    }

    #[test]
    fn resample_upsample_doubles_length() {
        let out = resample(&[0.0_f32; 80], 8_000, 16_000);
        assert_eq!(out.len(), 160);
    }
}
