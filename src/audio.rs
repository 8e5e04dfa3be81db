//! Hit sounds
//!
//! Every hit plays a random note from the configured scale. Synthesis lives
//! behind [`AudioSink`]; this module only decides whether and what to play.
//! Notes are never queued while the window is hidden, so returning to the tab
//! does not release a burst of stale sounds.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::settings::{BaseKey, MusicalScale, SoundSettings};
use crate::sim::SessionEvent;

/// Middle C (Hz)
const C4_HZ: f32 = 261.6256;
/// Hit notes span this many octaves above the base key
const OCTAVE_SPAN: u8 = 2;
/// Length of a hit note
pub const HIT_NOTE_MS: f32 = 120.0;

/// Audio output collaborator
pub trait AudioSink {
    fn play_tone(&mut self, freq_hz: f32, duration_ms: f32);
}

/// Frequency of a scale degree in a given octave above C4
pub fn note_frequency(key: BaseKey, scale: MusicalScale, degree: usize, octave: u8) -> f32 {
    let intervals = scale.intervals();
    let interval = intervals[degree % intervals.len()];
    let semitones = key.semitone() as i32 + interval as i32 + 12 * octave as i32;
    C4_HZ * 2f32.powf(semitones as f32 / 12.0)
}

/// Gate and note picker for hit sounds
#[derive(Debug, Clone)]
pub struct HitSounds {
    enabled: bool,
    scale: MusicalScale,
    key: BaseKey,
    rng: Pcg32,
}

impl HitSounds {
    pub fn new(sound: &SoundSettings, seed: u64) -> Self {
        Self {
            enabled: sound.sound_enabled,
            scale: sound.musical_scale,
            key: sound.base_key,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn apply(&mut self, sound: &SoundSettings) {
        self.enabled = sound.sound_enabled;
        self.scale = sound.musical_scale;
        self.key = sound.base_key;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Pick a random note of the current scale
    pub fn random_note(&mut self) -> f32 {
        let degree = self.rng.random_range(0..self.scale.intervals().len());
        let octave = self.rng.random_range(0..OCTAVE_SPAN);
        note_frequency(self.key, self.scale, degree, octave)
    }

    /// Note for the next hit, or `None` if sound is off or the window is hidden
    pub fn next_hit_note(&mut self, window_visible: bool) -> Option<f32> {
        if !self.enabled || !window_visible {
            return None;
        }
        Some(self.random_note())
    }
}

/// Route a session event to the sink; returns whether anything played
pub fn play_event(event: &SessionEvent, sink: &mut dyn AudioSink) -> bool {
    match event {
        SessionEvent::HitSound { freq_hz } => {
            sink.play_tone(*freq_hz, HIT_NOTE_MS);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        tones: Vec<f32>,
    }

    impl AudioSink for RecordingSink {
        fn play_tone(&mut self, freq_hz: f32, _duration_ms: f32) {
            self.tones.push(freq_hz);
        }
    }

    #[test]
    fn test_note_frequency() {
        let c4 = note_frequency(BaseKey::C, MusicalScale::Major, 0, 0);
        assert!((c4 - C4_HZ).abs() < 0.01);
        // A above middle C
        let a4 = note_frequency(BaseKey::A, MusicalScale::Major, 0, 0);
        assert!((a4 - 440.0).abs() < 0.01);
        // Degree wraps, octave doubles
        let c5 = note_frequency(BaseKey::C, MusicalScale::Major, 7, 1);
        assert!((c5 - C4_HZ * 2.0).abs() < 0.01);
    }

    #[test]
    fn test_gated_by_enabled_and_visibility() {
        let mut sounds = HitSounds::new(&SoundSettings::default(), 1);

        assert!(sounds.next_hit_note(true).is_some());
        assert!(sounds.next_hit_note(false).is_none());

        sounds.apply(&SoundSettings {
            sound_enabled: false,
            ..Default::default()
        });
        assert!(sounds.next_hit_note(true).is_none());
    }

    #[test]
    fn test_play_event_only_plays_hits() {
        let mut sink = RecordingSink::default();
        assert!(play_event(&SessionEvent::HitSound { freq_hz: 440.0 }, &mut sink));
        assert!(!play_event(&SessionEvent::BallLost, &mut sink));
        assert_eq!(sink.tones, vec![440.0]);
    }

    #[test]
    fn test_notes_stay_in_scale() {
        let settings = SoundSettings {
            sound_enabled: true,
            musical_scale: MusicalScale::Pentatonic,
            base_key: BaseKey::D,
        };
        let mut sounds = HitSounds::new(&settings, 42);
        let allowed: Vec<f32> = (0..5)
            .flat_map(|d| (0..OCTAVE_SPAN).map(move |o| (d, o)))
            .map(|(d, o)| note_frequency(BaseKey::D, MusicalScale::Pentatonic, d, o))
            .collect();
        for _ in 0..100 {
            let note = sounds.random_note();
            assert!(allowed.iter().any(|a| (a - note).abs() < 0.001));
        }
    }
}
