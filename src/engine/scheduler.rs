use crate::engine::chords::{Grouping, NoteRole};
use crate::model::timeline::{NoteKind, TempoEvent, TrackTimeline};
use log::{debug, warn};
use std::collections::HashMap;

/// One step of a track's encoding walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    Tempo(TempoEvent),

    /// A plain note-on, by index into the track events.
    Note(usize),

    /// A chord, by index into [`Grouping::chords`].
    Chord { chord: usize, time: u64 },

    /// A note-off, by index into the track events.
    NoteOff(usize),
}

/// Resolves the duration of every note-on in a single forward pass.
///
/// Note-offs close the open note-on of the same pitch. A note-on struck again before its note-off
/// lasts zero ticks, and one left open at the end of the track lasts `ticks_per_beat`. Entries for
/// note-offs are `None`.
pub fn resolve_durations(track: &TrackTimeline, ticks_per_beat: u16) -> Vec<Option<u64>> {
    let events = &track.events;
    let mut durations: Vec<Option<u64>> = vec![None; events.len()];
    let mut open_notes: HashMap<u8, usize> = HashMap::new();

    for (i, event) in events.iter().enumerate() {
        match event.kind {
            NoteKind::NoteOn => {
                if let Some(prev) = open_notes.insert(event.pitch, i) {
                    debug!(
                        "NoteOn for {} at tick {} re-struck at tick {} before its NoteOff..!",
                        event.pitch, events[prev].time, event.time
                    );
                    durations[prev] = Some(0);
                }
            }
            NoteKind::NoteOff => match open_notes.remove(&event.pitch) {
                Some(start) => durations[start] = Some(event.time - events[start].time),
                None => debug!(
                    "Orphaned NoteOff for {} at tick {} on track {}..!",
                    event.pitch, event.time, track.index
                ),
            },
        }
    }

    for (pitch, start) in open_notes {
        warn!(
            "Unclosed NoteOn for {} at tick {} on track {}, holding it for one beat..!",
            pitch, events[start].time, track.index
        );
        durations[start] = Some(ticks_per_beat as u64);
    }

    durations
}

/// Interleaves a track's notes and chords with the tempo changes that happen before its last
/// event. Tempo changes go first on equal ticks, and of several changes on one tick only the last
/// is kept. Absorbed chord members are left out.
pub fn schedule(track: &TrackTimeline, grouping: &Grouping, tempos: &[TempoEvent]) -> Vec<ScheduledEvent> {
    let end = track.last_time();
    let mut tempos = tempos.iter().filter(|t| t.time <= end).peekable();
    let mut scheduled: Vec<ScheduledEvent> = Vec::with_capacity(track.events.len());

    for (i, event) in track.events.iter().enumerate() {
        while let Some(tempo) = tempos.next_if(|t| t.time <= event.time) {
            if tempos.peek().is_some_and(|next| next.time == tempo.time) {
                continue;
            }
            scheduled.push(ScheduledEvent::Tempo(*tempo));
        }

        match (event.kind, grouping.role(i)) {
            (NoteKind::NoteOff, _) => scheduled.push(ScheduledEvent::NoteOff(i)),
            (NoteKind::NoteOn, Some(NoteRole::ChordAnchor(chord))) => {
                scheduled.push(ScheduledEvent::Chord {
                    chord,
                    time: event.time,
                });
            }
            (NoteKind::NoteOn, Some(NoteRole::Absorbed)) => {}
            (NoteKind::NoteOn, _) => scheduled.push(ScheduledEvent::Note(i)),
        }
    }

    scheduled
}
