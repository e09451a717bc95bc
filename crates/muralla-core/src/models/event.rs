use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "bookingUrl", default)]
    pub booking_url: String,
}

impl Event {
    /// Display time: `12:00 - 23:00`, `18:00`, or nothing.
    pub fn time_display(&self) -> Option<String> {
        match (&self.start_time, &self.end_time, &self.time) {
            (Some(start), Some(end), _) => Some(format!("{} - {}", start, end)),
            (Some(start), None, _) => Some(start.clone()),
            (None, _, Some(time)) => Some(time.clone()),
            _ => None,
        }
    }

    /// Events dated today or later. Dates compare lexically as `YYYY-MM-DD`.
    pub fn is_upcoming(&self, today: &str) -> bool {
        self.date.as_str() >= today
    }
}
