use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to parse WAV data: {0}")]
    Parse(#[from] hound::Error),
    #[error("WAV data declares zero channels")]
    NoChannels,
}

/// A decoded clip: mono samples in [-1, 1] at the clip's native rate.
#[derive(Debug, Clone)]
pub struct Clip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Clip {
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode a WAV buffer into a mono clip, averaging across channels.
pub fn decode(bytes: &[u8]) -> Result<Clip, WavError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(WavError::NoChannels);
    }
    let channels = usize::from(spec.channels);

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            reader.samples::<f32>().collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mut samples = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        samples.push(frame.iter().sum::<f32>() / channels as f32);
    }

    Ok(Clip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Linearly resample a clip to the target rate.
///
/// Mixing layers recorded at different rates without this corrupts the
/// timeline, so every decoded clip goes through here before placement.
#[must_use]
pub fn resample(clip: &Clip, target_rate: u32) -> Clip {
    if clip.sample_rate == target_rate || clip.samples.is_empty() {
        return Clip {
            samples: clip.samples.clone(),
            sample_rate: target_rate,
        };
    }

    let ratio = f64::from(clip.sample_rate) / f64::from(target_rate);
    let out_len = (clip.samples.len() as f64 / ratio).round() as usize;
    let last = clip.samples.len() - 1;

    let mut samples = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = (pos as usize).min(last);
        let next = (idx + 1).min(last);
        let frac = (pos - idx as f64) as f32;
        let a = clip.samples[idx];
        let b = clip.samples[next];
        samples.push(a + (b - a) * frac);
    }

    Clip {
        samples,
        sample_rate: target_rate,
    }
}

/// Encode two equal-length channel buffers as 16-bit stereo PCM WAV.
///
/// Layers are additively mixed upstream, so samples are clamped here
/// before integer quantization to avoid wraparound distortion.
pub fn encode_stereo(
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> Result<Vec<u8>, WavError> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for (l, r) in left.iter().zip(right.iter()) {
            writer
                .write_sample((l.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
            writer
                .write_sample((r.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Playback length in seconds of an encoded WAV buffer, if parseable.
#[must_use]
pub fn duration_of(bytes: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    let spec = reader.spec();
    Some(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer
                    .write_sample((s * f32::from(i16::MAX)) as i16)
                    .unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decode_round_trips_amplitude() {
        let bytes = mono_wav(&[0.5; 100], 44_100);
        let clip = decode(&bytes).unwrap();
        assert_eq!(clip.sample_rate, 44_100);
        assert_eq!(clip.samples.len(), 100);
        assert!((clip.samples[50] - 0.5).abs() < 0.001);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"definitely not a wav file").is_err());
    }

    #[test]
    fn resample_halves_length_going_down() {
        let clip = Clip {
            samples: vec![0.25; 44_100],
            sample_rate: 44_100,
        };
        let out = resample(&clip, 22_050);
        assert_eq!(out.sample_rate, 22_050);
        assert!((out.samples.len() as i64 - 22_050).abs() <= 1);
        assert!((out.samples[10_000] - 0.25).abs() < 0.001);
    }

    #[test]
    fn duration_of_reports_seconds() {
        let bytes = mono_wav(&vec![0.1; 88_200], 44_100);
        let d = duration_of(&bytes).unwrap();
        assert!((d - 2.0).abs() < 0.001);
    }
}
