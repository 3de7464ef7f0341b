/// League configuration for bracket enumeration
///
/// The viewer addresses a league by its slug:
/// `{base_url}?league={slug}&date={YYYY-MM-DD}`
///
/// `min_tier`/`min_wave` feed the threshold league assigner. They are an
/// approximation; run records carry no league of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueConfig {
    pub slug: &'static str,
    pub name: &'static str,
    pub min_tier: u32,
    pub min_wave: u32,
}

impl LeagueConfig {
    pub fn new(slug: &'static str, name: &'static str, min_tier: u32, min_wave: u32) -> Self {
        Self {
            slug,
            name,
            min_tier,
            min_wave,
        }
    }
}

/// Get the list of tracked leagues, strongest first
pub fn get_leagues() -> Vec<LeagueConfig> {
    vec![
        LeagueConfig::new("legend", "Legend", 14, 250),
        LeagueConfig::new("champion", "Champion", 11, 200),
        LeagueConfig::new("platinum", "Platinum", 8, 150),
        LeagueConfig::new("gold", "Gold", 6, 100),
        LeagueConfig::new("silver", "Silver", 3, 50),
        LeagueConfig::new("copper", "Copper", 0, 0),
    ]
}

/// Look up a tracked league by slug or display name (case-insensitive)
pub fn find_league(key: &str) -> Option<LeagueConfig> {
    get_leagues()
        .into_iter()
        .find(|l| l.slug.eq_ignore_ascii_case(key) || l.name.eq_ignore_ascii_case(key))
}
