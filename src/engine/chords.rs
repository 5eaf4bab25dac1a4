use crate::model::timeline::{ChordGroup, NoteEvent};
use log::{debug, warn};

const OCTAVE: u8 = 12;
const PREFERRED_INTERVAL: std::ops::RangeInclusive<u8> = 2..=7;

/// What became of a single note-on after grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteRole {
    /// Encoded as a plain note.
    Single,

    /// First note-on of a cluster; the chord at this index of [`Grouping::chords`] is encoded here.
    ChordAnchor(usize),

    /// Folded into a chord anchored at an earlier note-on, or dropped as an excess member.
    Absorbed,
}

#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub chords: Vec<ChordGroup>,

    /// One entry per track event; `None` for note-offs.
    pub roles: Vec<Option<NoteRole>>,
}

impl Grouping {
    pub fn role(&self, index: usize) -> Option<NoteRole> {
        self.roles.get(index).copied().flatten()
    }
}

/// Clusters note-ons that start within `tolerance_ticks` of a cluster's first note-on.
///
/// Every note-on gets exactly one role, so nothing downstream can emit the same occurrence twice.
/// Only the last occurrence of a pitch inside a cluster is kept; it is the one whose duration runs
/// to the note-off. Clusters with a single distinct pitch stay a plain note. Larger clusters keep
/// two pitches, see [`choose_pair`], and the rest are absorbed without being encoded.
pub fn group_chords(events: &[NoteEvent], tolerance_ticks: f64) -> Grouping {
    let mut roles: Vec<Option<NoteRole>> = vec![None; events.len()];
    let mut chords: Vec<ChordGroup> = Vec::new();

    let note_ons: Vec<usize> = (0..events.len()).filter(|&i| events[i].is_note_on()).collect();

    let mut start = 0;
    while start < note_ons.len() {
        let anchor_time = events[note_ons[start]].time;
        let mut end = start + 1;
        while end < note_ons.len()
            && ((events[note_ons[end]].time - anchor_time) as f64) < tolerance_ticks
        {
            end += 1;
        }

        let cluster = &note_ons[start..end];
        let kept = distinct_members(events, cluster);
        match cluster_pair(events, &kept) {
            Some((low, high)) => {
                for &i in cluster {
                    roles[i] = Some(NoteRole::Absorbed);
                }
                roles[cluster[0]] = Some(NoteRole::ChordAnchor(chords.len()));

                let excess = cluster.len() - 2;
                if excess > 0 {
                    warn!(
                        "Chord at tick {} has {} note-ons, dropping {} of them..!",
                        anchor_time,
                        cluster.len(),
                        excess
                    );
                }

                debug!(
                    "Chord at tick {}: {} + {}",
                    anchor_time, events[low].pitch, events[high].pitch
                );
                chords.push(ChordGroup {
                    time: anchor_time,
                    low,
                    high,
                    members: cluster.to_vec(),
                });
            }
            None => {
                if cluster.len() > kept.len() {
                    debug!(
                        "Pitch {} struck {} times at tick {}, keeping one..!",
                        events[cluster[0]].pitch,
                        cluster.len(),
                        anchor_time
                    );
                }
                for &i in cluster {
                    let role = if kept.contains(&i) { NoteRole::Single } else { NoteRole::Absorbed };
                    roles[i] = Some(role);
                }
            }
        }

        start = end;
    }

    Grouping { chords, roles }
}

/// The last note-on of every pitch in `cluster`, in cluster order.
fn distinct_members(events: &[NoteEvent], cluster: &[usize]) -> Vec<usize> {
    cluster
        .iter()
        .enumerate()
        .filter(|&(n, &i)| !cluster[n + 1..].iter().any(|&j| events[j].pitch == events[i].pitch))
        .map(|(_, &i)| i)
        .collect()
}

/// Event indices of the two pitches a cluster is reduced to, or `None` if it holds fewer than two
/// distinct pitches. `distinct` must not repeat a pitch.
fn cluster_pair(events: &[NoteEvent], distinct: &[usize]) -> Option<(usize, usize)> {
    if distinct.len() < 2 {
        return None;
    }

    let mut distinct = distinct.to_vec();
    distinct.sort_by_key(|&i| events[i].pitch);
    let pitches: Vec<u8> = distinct.iter().map(|&i| events[i].pitch).collect();
    let (low, high) = choose_pair(&pitches);

    Some((distinct[low], distinct[high]))
}

/// Picks two of the ascending, distinct `pitches` and returns their positions.
///
/// Lowest and highest are kept unless they are more than an octave apart and there is a choice.
/// Then the first neighbouring pair a 2nd to a 5th apart wins, otherwise the closest neighbours.
pub fn choose_pair(pitches: &[u8]) -> (usize, usize) {
    let last = pitches.len().saturating_sub(1);
    if pitches.len() <= 2 || pitches[last] - pitches[0] <= OCTAVE {
        return (0, last);
    }

    let mut min_interval = OCTAVE;
    let mut selected = (0, 1);
    for i in 0..last {
        let interval = pitches[i + 1] - pitches[i];
        if PREFERRED_INTERVAL.contains(&interval) {
            return (i, i + 1);
        } else if interval < min_interval {
            min_interval = interval;
            selected = (i, i + 1);
        }
    }

    selected
}
