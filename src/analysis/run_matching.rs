use std::collections::BTreeMap;

use crate::domain::{RunRecord, TournamentWindow};

/// Each player's highest-wave run inside the tournament window.
///
/// Equal waves resolve to the earlier submission. Output is ordered by player id.
pub fn best_runs_in_window(runs: &[RunRecord], window: &TournamentWindow) -> Vec<RunRecord> {
    let mut best: BTreeMap<&str, &RunRecord> = BTreeMap::new();

    for run in runs.iter().filter(|r| window.contains(r.recorded_at)) {
        best.entry(run.player_id.as_str())
            .and_modify(|current| {
                if is_better(run, *current) {
                    *current = run;
                }
            })
            .or_insert(run);
    }

    best.into_values().cloned().collect()
}

fn is_better(candidate: &RunRecord, current: &RunRecord) -> bool {
    candidate.wave > current.wave
        || (candidate.wave == current.wave && candidate.recorded_at < current.recorded_at)
}
