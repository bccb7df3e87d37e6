use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    /// IANA label for display; offset below is what the engine actually uses.
    pub timezone: String,
    pub utc_offset_minutes: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Business {
    /// Current wall-clock time in the business's civil time. All stored
    /// timestamps use this frame, so horizon checks and dashboard windows
    /// compare naturally.
    pub fn local_now(&self) -> NaiveDateTime {
        chrono::Utc::now().naive_utc() + chrono::Duration::minutes(self.utc_offset_minutes as i64)
    }
}
