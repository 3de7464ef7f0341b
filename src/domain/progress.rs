use log::info;

/// Track progress of bracket enumeration for one league
pub struct EnumerationProgress {
    league: String,
    extracted: usize,
    skipped: usize,
}

impl EnumerationProgress {
    pub fn new(league: &str) -> Self {
        Self {
            league: league.to_string(),
            extracted: 0,
            skipped: 0,
        }
    }

    pub fn increment_extracted(&mut self) {
        self.extracted += 1;
        self.log_progress();
    }

    pub fn increment_skipped(&mut self) {
        self.skipped += 1;
        self.log_progress();
    }

    pub fn current_count(&self) -> usize {
        self.extracted + self.skipped
    }

    pub fn finish(&self) {
        info!(
            "  → {}: {} brackets visited ({} extracted, {} skipped)",
            self.league,
            self.current_count(),
            self.extracted,
            self.skipped
        );
    }

    fn log_progress(&self) {
        if is_milestone(self.current_count()) {
            info!(
                "  → {} progress: {} brackets ({} extracted, {} skipped)",
                self.league,
                self.current_count(),
                self.extracted,
                self.skipped
            );
        }
    }
}

fn is_milestone(count: usize) -> bool {
    count % 10 == 0
}
