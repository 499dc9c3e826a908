use mc_audio::MixSettings;

/// Seam between the orchestrator and the audio engine, so tests can
/// substitute the mix without touching real WAV data.
pub trait EpisodeMixer {
    fn mix(
        &self,
        intro_stinger: &[u8],
        voice: &[u8],
        intro_track: &[u8],
        outro_track: &[u8],
    ) -> Vec<u8>;

    fn duration_of(&self, bytes: &[u8]) -> Option<f64>;
}

/// The production mixer: `mc_audio`'s shared-timeline mix with the
/// standard episode settings.
#[derive(Default)]
pub struct TimelineMixer {
    settings: MixSettings,
}

impl EpisodeMixer for TimelineMixer {
    fn mix(
        &self,
        intro_stinger: &[u8],
        voice: &[u8],
        intro_track: &[u8],
        outro_track: &[u8],
    ) -> Vec<u8> {
        mc_audio::mix_episode(
            intro_stinger,
            voice,
            intro_track,
            outro_track,
            &self.settings,
        )
    }

    fn duration_of(&self, bytes: &[u8]) -> Option<f64> {
        mc_audio::duration_of(bytes)
    }
}
