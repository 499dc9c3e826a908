use crate::wav::{self, Clip, WavError};

/// Timeline constants for one episode mix.
///
/// Defaults match the produced sound of the shipped episodes: the music
/// bed opens alone for two seconds, sits at 5% under the narration, and
/// climbs back to 25% over the narration's last three seconds.
#[derive(Debug, Clone)]
pub struct MixSettings {
    /// Working rate of the output; inputs at other rates are resampled.
    pub sample_rate: u32,
    /// When the music bed enters, in seconds from the start.
    pub music_start: f64,
    /// Narration entry, in seconds after the music start.
    pub voice_delay: f64,
    /// Linear narration fade-in length in seconds.
    pub voice_fade_in: f64,
    /// Music gain when no narration is playing.
    pub music_base_level: f32,
    /// Music gain while narration is active.
    pub music_duck_level: f32,
    /// Seconds before narration end where the music starts climbing back.
    pub fade_back_window: f64,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            music_start: 0.0,
            voice_delay: 2.0,
            voice_fade_in: 0.5,
            music_base_level: 0.25,
            music_duck_level: 0.05,
            fade_back_window: 3.0,
        }
    }
}

/// Mix narration and incidental music into one 16-bit stereo WAV buffer.
///
/// Empty incidental buffers mean "asset absent" and that layer is
/// skipped. If anything fails to decode or mix, the narration bytes are
/// returned unmodified; a degraded episode beats no episode.
///
/// The outro track is a second music-bed candidate carried in episode
/// metadata; it is not placed on the timeline. Only one music layer is
/// mixed per episode.
#[must_use]
pub fn mix_episode(
    intro_stinger: &[u8],
    voice: &[u8],
    intro_track: &[u8],
    _outro_track: &[u8],
    settings: &MixSettings,
) -> Vec<u8> {
    match mix_layers(intro_stinger, voice, intro_track, settings) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                "audio mix failed, falling back to unmixed narration: {e}"
            );
            voice.to_vec()
        }
    }
}

fn mix_layers(
    stinger: &[u8],
    voice_bytes: &[u8],
    music_bytes: &[u8],
    s: &MixSettings,
) -> Result<Vec<u8>, WavError> {
    let rate = s.sample_rate;

    let voice = wav::resample(&wav::decode(voice_bytes)?, rate);

    // The stinger is decoded for validation even though the current
    // layout opens with the music bed rather than a stinger hit.
    if !stinger.is_empty() {
        wav::decode(stinger)?;
    }

    let music = if music_bytes.is_empty() {
        None
    } else {
        Some(wav::resample(&wav::decode(music_bytes)?, rate))
    };

    let voice_start = s.music_start + s.voice_delay;
    let voice_duration = voice.duration();
    let music_duration = music.as_ref().map_or(0.0, Clip::duration);
    let total_duration =
        (voice_start + voice_duration).max(s.music_start + music_duration);

    let out_len = (total_duration * f64::from(rate)).ceil() as usize;
    let mut left = vec![0.0f32; out_len];
    let mut right = vec![0.0f32; out_len];

    let voice_start_sample = (voice_start * f64::from(rate)) as usize;
    let voice_end_sample =
        ((voice_start + voice_duration) * f64::from(rate)) as usize;

    if let Some(music) = &music {
        let music_start_sample = (s.music_start * f64::from(rate)) as usize;
        // Clamp so a narration shorter than the window still ramps from
        // its own start instead of before it.
        let fade_back_start = (voice_end_sample as i64
            - (s.fade_back_window * f64::from(rate)) as i64)
            .max(voice_start_sample as i64) as usize;

        for (i, &sample) in music.samples.iter().enumerate() {
            let idx = music_start_sample + i;
            if idx >= out_len {
                break;
            }

            let volume = if idx >= voice_end_sample {
                s.music_base_level
            } else if idx >= fade_back_start {
                let progress = (idx - fade_back_start) as f32
                    / (voice_end_sample - fade_back_start) as f32;
                s.music_duck_level
                    + (s.music_base_level - s.music_duck_level) * progress
            } else if idx >= voice_start_sample {
                s.music_duck_level
            } else {
                s.music_base_level
            };

            left[idx] += sample * volume;
            right[idx] += sample * volume;
        }
    }

    let fade_in_samples = (s.voice_fade_in * f64::from(rate)) as usize;
    for (i, &sample) in voice.samples.iter().enumerate() {
        let idx = voice_start_sample + i;
        if idx >= out_len {
            break;
        }

        let gain = if i < fade_in_samples {
            i as f32 / fade_in_samples as f32
        } else {
            1.0
        };

        left[idx] += sample * gain;
        right[idx] += sample * gain;
    }

    wav::encode_stereo(&left, &right, rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RATE: u32 = 44_100;

    fn tone_wav(amplitude: f32, duration_secs: f64, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let len = (duration_secs * f64::from(sample_rate)) as usize;
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..len {
                writer
                    .write_sample((amplitude * f32::from(i16::MAX)) as i16)
                    .unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn sample_at(output: &[u8], t: f64) -> f32 {
        let clip = wav::decode(output).unwrap();
        clip.samples[(t * f64::from(clip.sample_rate)) as usize]
    }

    #[test]
    fn output_duration_is_max_of_voice_and_music_spans() {
        let voice = tone_wav(0.5, 5.0, RATE);
        let music = tone_wav(0.5, 4.0, RATE);

        let out =
            mix_episode(&[], &voice, &music, &[], &MixSettings::default());

        // Voice enters at 2.0s and runs 5.0s, past the 4.0s music bed.
        let d = output_duration(&out);
        assert!((d - 7.0).abs() < 0.001, "duration was {d}");
    }

    #[test]
    fn music_outlasting_voice_sets_total_duration() {
        let voice = tone_wav(0.5, 1.0, RATE);
        let music = tone_wav(0.5, 10.0, RATE);

        let out =
            mix_episode(&[], &voice, &music, &[], &MixSettings::default());

        let d = output_duration(&out);
        assert!((d - 10.0).abs() < 0.001, "duration was {d}");
    }

    #[test]
    fn music_ducks_under_voice_and_recovers_after() {
        // Silent narration makes the music envelope directly observable.
        let voice = tone_wav(0.0, 10.0, RATE);
        let music = tone_wav(0.5, 20.0, RATE);

        let out =
            mix_episode(&[], &voice, &music, &[], &MixSettings::default());

        // Voice active 2.0..12.0s, fade-back 9.0..12.0s.
        let before_voice = sample_at(&out, 1.0);
        let ducked = sample_at(&out, 5.0);
        let mid_fade_back = sample_at(&out, 10.5);
        let after_voice = sample_at(&out, 15.0);

        assert!((before_voice - 0.5 * 0.25).abs() < 0.005);
        assert!((ducked - 0.5 * 0.05).abs() < 0.005);
        assert!((mid_fade_back - 0.5 * 0.15).abs() < 0.01);
        assert!((after_voice - 0.5 * 0.25).abs() < 0.005);
    }

    #[test]
    fn empty_music_yields_offset_faded_voice_only() {
        let voice = tone_wav(0.8, 3.0, RATE);

        let out = mix_episode(&[], &voice, &[], &[], &MixSettings::default());

        let d = output_duration(&out);
        assert!((d - 5.0).abs() < 0.001, "duration was {d}");

        // Silence before the narration enters.
        assert!(sample_at(&out, 1.0).abs() < 0.001);
        // 0.1s into the 0.5s fade-in: 20% of full amplitude.
        let fading = sample_at(&out, 2.1);
        assert!((fading - 0.8 * 0.2).abs() < 0.02, "fading was {fading}");
        // Well past the fade-in: full amplitude.
        assert!((sample_at(&out, 3.0) - 0.8).abs() < 0.005);
    }

    #[test]
    fn short_voice_clamps_fade_back_to_voice_start() {
        // 1.0s narration, shorter than the 3.0s fade-back window.
        let voice = tone_wav(0.0, 1.0, RATE);
        let music = tone_wav(0.5, 10.0, RATE);

        let out =
            mix_episode(&[], &voice, &music, &[], &MixSettings::default());

        // The ramp spans the whole narration (2.0..3.0s); its midpoint
        // sits halfway between duck and base level.
        let midpoint = sample_at(&out, 2.5);
        assert!((midpoint - 0.5 * 0.15).abs() < 0.01, "midpoint {midpoint}");
        assert!((sample_at(&out, 1.0) - 0.5 * 0.25).abs() < 0.005);
        assert!((sample_at(&out, 5.0) - 0.5 * 0.25).abs() < 0.005);
    }

    #[test]
    fn mismatched_sample_rates_keep_timing() {
        let voice = tone_wav(0.0, 1.0, RATE);
        let music = tone_wav(0.5, 4.0, 22_050);

        let out =
            mix_episode(&[], &voice, &music, &[], &MixSettings::default());

        let d = output_duration(&out);
        assert!((d - 4.0).abs() < 0.001, "duration was {d}");
        // Past voice end (3.0s), music back at base level.
        assert!((sample_at(&out, 3.5) - 0.5 * 0.25).abs() < 0.005);
    }

    #[test]
    fn undecodable_input_falls_back_to_narration_bytes() {
        let voice = b"not audio at all".to_vec();
        let out = mix_episode(&[], &voice, &[], &[], &MixSettings::default());
        assert_eq!(out, voice);
    }

    #[test]
    fn bad_music_bed_falls_back_to_narration_bytes() {
        let voice = tone_wav(0.5, 1.0, RATE);
        let out = mix_episode(
            &[],
            &voice,
            b"truncated music bed",
            &[],
            &MixSettings::default(),
        );
        assert_eq!(out, voice);
    }

    fn output_duration(bytes: &[u8]) -> f64 {
        wav::duration_of(bytes).unwrap()
    }
}
