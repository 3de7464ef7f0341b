use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

const LOOKBACK_DAYS: i64 = 14;

/// Time span during which runs count towards a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TournamentWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Fixed weekly tournament schedule (UTC)
#[derive(Debug, Clone)]
pub struct TournamentCalendar {
    weekdays: Vec<Weekday>,
    window_hours: i64,
}

impl TournamentCalendar {
    pub fn new(weekdays: Vec<Weekday>, window_hours: i64) -> Self {
        Self {
            weekdays,
            window_hours,
        }
    }

    /// Wednesday and Saturday tournaments
    pub fn with_window_hours(window_hours: i64) -> Self {
        Self::new(vec![Weekday::Wed, Weekday::Sat], window_hours)
    }

    pub fn is_tournament_day(&self, date: NaiveDate) -> bool {
        self.weekdays.contains(&date.weekday())
    }

    pub fn window(&self, date: NaiveDate) -> TournamentWindow {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        TournamentWindow {
            start,
            end: start + Duration::hours(self.window_hours),
        }
    }

    /// Most recent tournament whose window has fully closed at `now`
    pub fn latest_completed(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = now.date_naive();

        (0..=LOOKBACK_DAYS)
            .map(|offset| today - Duration::days(offset))
            .filter(|date| self.is_tournament_day(*date))
            .find(|date| self.window(*date).end <= now)
    }
}

impl Default for TournamentCalendar {
    fn default() -> Self {
        Self::with_window_hours(30)
    }
}
