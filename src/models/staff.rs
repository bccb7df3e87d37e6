use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub business_id: String,
    pub name: String,
    /// JSON-encoded weekly schedule, parsed on demand via
    /// `WorkingHours::from_json`.
    pub working_hours: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Staff {
    pub fn schedule(&self) -> WorkingHours {
        self.working_hours
            .as_deref()
            .and_then(|json| WorkingHours::from_json(json).ok())
            .unwrap_or_default()
    }
}

/// One entry per day of week, 0=Sunday .. 6=Saturday. Times are local
/// wall-clock "HH:MM".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    pub weekday: u8,
    pub start: String,
    pub end: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingHours {
    pub days: Vec<DayHours>,
}

impl WorkingHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: WorkingHours = serde_json::from_str(s)?;
        for day in &hours.days {
            if day.weekday > 6 {
                anyhow::bail!("invalid weekday: {}", day.weekday);
            }
            parse_time(&day.start)?;
            parse_time(&day.end)?;
        }
        Ok(hours)
    }

    /// Working window for a weekday, or None when the day is disabled, has no
    /// entry, or the window is empty/inverted.
    pub fn window_for(&self, weekday: u8) -> Option<(NaiveTime, NaiveTime)> {
        let day = self.days.iter().find(|d| d.weekday == weekday && d.enabled)?;
        let start = parse_time(&day.start).ok()?;
        let end = parse_time(&day.end).ok()?;
        if end <= start {
            return None;
        }
        Some((start, end))
    }

    /// True when `[start, end)` lies entirely inside the working window for
    /// that day.
    pub fn contains(&self, start: &NaiveDateTime, end: &NaiveDateTime) -> bool {
        let weekday = weekday_index(&start.date());
        match self.window_for(weekday) {
            Some((day_start, day_end)) => {
                start.date() == end.date()
                    && end > start
                    && start.time() >= day_start
                    && end.time() <= day_end
            }
            None => false,
        }
    }
}

/// 0=Sunday .. 6=Saturday.
pub fn weekday_index(date: &chrono::NaiveDate) -> u8 {
    chrono::Datelike::weekday(date).num_days_from_sunday() as u8
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| anyhow::anyhow!("invalid time format: {s}"))
}
