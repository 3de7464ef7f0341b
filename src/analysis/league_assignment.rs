use crate::config::{LeagueConfig, get_leagues};
use crate::domain::RunRecord;

/// Decides which league's brackets a run should be compared against.
///
/// Run records have no authoritative league, so implementations are
/// approximations that can be swapped once real league data exists.
pub trait LeagueAssigner: Send + Sync {
    fn assign(&self, run: &RunRecord) -> Option<LeagueConfig>;
}

/// Picks the strongest league whose tier and wave minimums the run meets
pub struct ThresholdLeagueAssigner {
    leagues: Vec<LeagueConfig>,
}

impl ThresholdLeagueAssigner {
    /// `leagues` must be ordered strongest first
    pub fn new(leagues: Vec<LeagueConfig>) -> Self {
        Self { leagues }
    }

    pub fn from_tracked_leagues() -> Self {
        Self::new(get_leagues())
    }
}

impl LeagueAssigner for ThresholdLeagueAssigner {
    fn assign(&self, run: &RunRecord) -> Option<LeagueConfig> {
        self.leagues
            .iter()
            .find(|league| run.tier >= league.min_tier && run.wave >= league.min_wave)
            .or_else(|| self.leagues.last())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn run(tier: u32, wave: u32) -> RunRecord {
        RunRecord {
            run_id: 1,
            player_id: "P1".to_string(),
            player_name: "player".to_string(),
            tier,
            wave,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn strongest_matching_league_wins() {
        let assigner = ThresholdLeagueAssigner::from_tracked_leagues();

        assert_eq!(assigner.assign(&run(16, 900)).map(|l| l.slug), Some("legend"));
        assert_eq!(assigner.assign(&run(11, 210)).map(|l| l.slug), Some("champion"));
        assert_eq!(assigner.assign(&run(6, 101)).map(|l| l.slug), Some("gold"));
    }

    #[test]
    fn both_thresholds_must_hold() {
        let assigner = ThresholdLeagueAssigner::from_tracked_leagues();
        // High tier with a weak wave does not reach Legend
        assert_eq!(assigner.assign(&run(15, 120)).map(|l| l.slug), Some("gold"));
    }

    #[test]
    fn falls_back_to_weakest_league() {
        let leagues = vec![
            LeagueConfig::new("top", "Top", 10, 100),
            LeagueConfig::new("low", "Low", 5, 50),
        ];
        let assigner = ThresholdLeagueAssigner::new(leagues);
        assert_eq!(assigner.assign(&run(1, 1)).map(|l| l.slug), Some("low"));
    }

    #[test]
    fn no_leagues_assigns_nothing() {
        let assigner = ThresholdLeagueAssigner::new(Vec::new());
        assert!(assigner.assign(&run(10, 10)).is_none());
    }
}
