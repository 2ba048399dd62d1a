//! Audio cues
//!
//! The encounter never plays sound itself. It asks an [`AudioSink`] to play named
//! cues and keeps the returned handles so looping cues can be stopped later.

use std::sync::{Arc, Mutex};

/// Handle to a playing cue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

/// Audio collaborator of an encounter
pub trait AudioSink: Send + Sync {
    /// Start a cue. Returns `None` if nothing is playing (for example a muted sink).
    fn play(&mut self, cue: &str, looping: bool) -> Option<AudioHandle>;

    /// Stop a cue started by [`AudioSink::play`]. Unknown handles are ignored.
    fn stop(&mut self, handle: AudioHandle);
}

/// Plays nothing. Used headless and in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: &str, _looping: bool) -> Option<AudioHandle> {
        None
    }

    fn stop(&mut self, _handle: AudioHandle) {}
}

/// What a [`RecordingAudio`] has seen so far
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioJournal {
    /// Every cue started, in order
    pub played: Vec<String>,
    /// Handles that are started and not yet stopped
    pub active: Vec<AudioHandle>,
    pub stopped: Vec<AudioHandle>,
}

/// Records cues instead of playing them.
///
/// Clones share the same journal, so a clone kept outside the encounter can
/// inspect what the encounter played.
#[derive(Clone, Debug, Default)]
pub struct RecordingAudio {
    journal: Arc<Mutex<AudioJournal>>,
    next_handle: Arc<Mutex<u64>>,
}

impl RecordingAudio {
    pub fn journal(&self) -> AudioJournal {
        self.journal
            .lock()
            .map(|journal| journal.clone())
            .unwrap_or_default()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: &str, _looping: bool) -> Option<AudioHandle> {
        let handle = {
            let mut next = self.next_handle.lock().ok()?;
            *next += 1;
            AudioHandle(*next)
        };
        let mut journal = self.journal.lock().ok()?;
        journal.played.push(cue.to_string());
        journal.active.push(handle);
        Some(handle)
    }

    fn stop(&mut self, handle: AudioHandle) {
        if let Ok(mut journal) = self.journal.lock() {
            let before = journal.active.len();
            journal.active.retain(|active| *active != handle);
            if journal.active.len() != before {
                journal.stopped.push(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_audio_tracks_active_cues() {
        let audio = RecordingAudio::default();
        let mut sink = audio.clone();

        let precast = sink.play("spell.precast", true).unwrap();
        sink.play("spell.cast", false);
        sink.stop(precast);
        sink.stop(precast);

        let journal = audio.journal();
        assert_eq!(journal.played, vec!["spell.precast", "spell.cast"]);
        assert_eq!(journal.stopped, vec![precast]);
        assert_eq!(journal.active.len(), 1);
    }

    #[test]
    fn test_silent_audio_returns_no_handle() {
        assert_eq!(SilentAudio.play("spell.cast", false), None);
    }
}
