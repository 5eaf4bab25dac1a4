use crate::model::score::TrackLabel;
use crate::model::timeline::TrackTimeline;
use log::debug;
use std::cmp::Reverse;

/// Tracks with note events, densest first. Equal note-on counts keep file order.
pub fn rank_tracks(tracks: &[TrackTimeline]) -> Vec<&TrackTimeline> {
    let mut ranked: Vec<&TrackTimeline> = tracks.iter().filter(|t| t.has_content()).collect();
    ranked.sort_by_key(|t| Reverse(t.note_on_count()));
    ranked
}

/// Assigns the densest track to melody and the next two to the harmonies. Slots without a track
/// are `None`; anything past the third track is dropped.
pub fn select_tracks(tracks: &[TrackTimeline]) -> [(TrackLabel, Option<&TrackTimeline>); 3] {
    let ranked = rank_tracks(tracks);

    for (rank, track) in ranked.iter().enumerate() {
        debug!(
            "Rank {}: track {} with {} note-on(s){}",
            rank,
            track.index,
            track.note_on_count(),
            if rank >= TrackLabel::ALL.len() { " (dropped)" } else { "" }
        );
    }

    let mut ranked = ranked.into_iter();
    TrackLabel::ALL.map(|label| (label, ranked.next()))
}
