//! Audio file loading.
//!
//! Decodes a user-selected WAV file into per-channel `f32` samples with
//! `hound`.  Integer PCM of any bit depth is scaled to `[-1.0, 1.0]`; float
//! files are taken as-is.  When several files are selected only the first is
//! used ([`load_first`]).

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::resample::deinterleave;

// ---------------------------------------------------------------------------
// LoadError
// ---------------------------------------------------------------------------

/// Reasons a file could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no file selected")]
    NothingSelected,

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("failed to decode audio: {0}")]
    DecodeStream(#[from] hound::Error),

    #[error("file has no audio channels")]
    NoChannels,
}

// ---------------------------------------------------------------------------
// LoadedAudio
// ---------------------------------------------------------------------------

/// Decoded file contents, ready to replace a session's sample store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAudio {
    /// Channel-major samples in `[-1.0, 1.0]`.
    pub channels: Vec<Vec<f32>>,
    /// File sample rate in Hz.
    pub sample_rate: u32,
}

impl LoadedAudio {
    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        let len = self.channels.first().map_or(0, Vec::len);
        if self.sample_rate == 0 {
            return 0.0;
        }
        len as f64 / self.sample_rate as f64
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode WAV data from any reader.
pub fn decode_wav<R: Read>(reader: R) -> Result<LoadedAudio, LoadError> {
    let reader = hound::WavReader::new(reader)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(LoadError::NoChannels);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(LoadedAudio {
        channels: deinterleave(&interleaved, spec.channels),
        sample_rate: spec.sample_rate,
    })
}

/// Decode the WAV file at `path`.
pub fn load_file(path: &Path) -> Result<LoadedAudio, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        source: hound::Error::IoError(e),
    })?;
    decode_wav(std::io::BufReader::new(file)).map_err(|e| match e {
        LoadError::DecodeStream(source) => LoadError::Decode {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Load the first of the selected files; the rest are ignored.
pub fn load_first(paths: &[PathBuf]) -> Result<LoadedAudio, LoadError> {
    let first = paths.first().ok_or(LoadError::NothingSelected)?;
    if paths.len() > 1 {
        log::info!(
            "load: {} files selected, using {}",
            paths.len(),
            first.display()
        );
    }
    load_file(first)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_pcm16(path: &Path, channels: u16, rate: u32, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create");
        for &s in frames {
            writer.write_sample(s).expect("write");
        }
        writer.finalize().expect("finalize");
    }

    #[test]
    fn pcm16_stereo_is_scaled_and_split() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("clip.wav");
        write_pcm16(&path, 2, 22_050, &[16_384, -16_384, 0, 32_767]);

        let audio = load_file(&path).expect("load");
        assert_eq!(audio.sample_rate, 22_050);
        assert_eq!(audio.channels.len(), 2);
        assert_eq!(audio.channels[0], vec![0.5, 0.0]);
        assert_eq!(audio.channels[1][0], -0.5);
        assert!((audio.channels[1][1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn only_first_selection_is_used() {
        let dir = tempdir().expect("temp dir");
        let first = dir.path().join("first.wav");
        let second = dir.path().join("second.wav");
        write_pcm16(&first, 1, 8_000, &[0; 800]);
        write_pcm16(&second, 1, 16_000, &[0; 16]);

        let audio = load_first(&[first, second]).expect("load");
        assert_eq!(audio.sample_rate, 8_000);
        assert!((audio.duration_secs() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn empty_selection_is_an_error() {
        assert!(matches!(load_first(&[]), Err(LoadError::NothingSelected)));
    }

    #[test]
    fn garbage_reports_path() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not a riff file").expect("write");

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }), "{err}");
        assert!(err.to_string().contains("noise.wav"));
    }
}
