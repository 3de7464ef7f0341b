use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one bracket within a (league, tournament date).
///
/// Assigned by the results viewer; opaque to us beyond its format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BracketId(String);

impl BracketId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BracketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a bracket roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub player_id: String,
    pub display_name: String,
    pub real_name: String,
    pub wave: u32,
    pub rank: u32,
}

/// A fully rendered, validated bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub bracket_id: BracketId,
    pub league: String,
    pub tournament_date: NaiveDate,
    /// Rank-ascending
    pub players: Vec<PlayerEntry>,
    pub median_wave: f64,
    pub total_waves: u64,
}

impl Bracket {
    /// Builds a bracket, sorting players by rank and deriving the wave aggregates.
    pub fn new(
        bracket_id: BracketId,
        league: &str,
        tournament_date: NaiveDate,
        mut players: Vec<PlayerEntry>,
    ) -> Self {
        players.sort_by_key(|p| p.rank);
        let median_wave = median_wave(&players);
        let total_waves = total_waves(&players);

        Self {
            bracket_id,
            league: league.to_string(),
            tournament_date,
            players,
            median_wave,
            total_waves,
        }
    }

    pub fn waves(&self) -> impl Iterator<Item = u32> + '_ {
        self.players.iter().map(|p| p.wave)
    }

    pub fn winning_wave(&self) -> Option<u32> {
        self.waves().max()
    }

    pub fn find_player(&self, player_id: &str) -> Option<&PlayerEntry> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}

pub fn median_wave(players: &[PlayerEntry]) -> f64 {
    if players.is_empty() {
        return 0.0;
    }

    let mut waves: Vec<u32> = players.iter().map(|p| p.wave).collect();
    waves.sort_unstable();

    let mid = waves.len() / 2;
    if waves.len() % 2 == 0 {
        (waves[mid - 1] as f64 + waves[mid] as f64) / 2.0
    } else {
        waves[mid] as f64
    }
}

pub fn total_waves(players: &[PlayerEntry]) -> u64 {
    players.iter().map(|p| p.wave as u64).sum()
}

/// Every bracket of one league for one tournament date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub league: String,
    pub tournament_date: NaiveDate,
    pub brackets: Vec<Bracket>,
}

impl TournamentSnapshot {
    pub fn player_count(&self) -> usize {
        self.brackets.iter().map(|b| b.players.len()).sum()
    }

    /// Locates the bracket a player was actually assigned to
    pub fn find_player(&self, player_id: &str) -> Option<(&Bracket, &PlayerEntry)> {
        self.brackets
            .iter()
            .find_map(|b| b.find_player(player_id).map(|p| (b, p)))
    }
}

/// A player submission tracked internally, independent of the viewer.
///
/// Run records carry no league; one is assigned heuristically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: i64,
    pub player_id: String,
    pub player_name: String,
    pub tier: u32,
    pub wave: u32,
    pub recorded_at: DateTime<Utc>,
}
