use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column keys of the bookings table, in display order.
pub const BOOKING_COLUMNS: [&str; 6] = [
    "start_date",
    "duration",
    "class_name",
    "studio_name",
    "coach",
    "status",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "bookingUUId", alias = "bookingUuid", default)]
    pub booking_uuid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "class", alias = "otfClass")]
    pub class: StudioClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioClass {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "startDateTime", alias = "startsAtLocal", default)]
    pub start_date_time: Option<String>,
    #[serde(rename = "endDateTime", alias = "endsAtLocal", default)]
    pub end_date_time: Option<String>,
    /// Length of the class in minutes
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub coach: Option<Coach>,
    #[serde(default)]
    pub studio: Option<Studio>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coach {
    #[serde(rename = "firstName", alias = "first_name", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", alias = "last_name", default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Studio {
    #[serde(rename = "studioName", alias = "studio_name", default)]
    pub studio_name: Option<String>,
}

/// Parse a class timestamp. The API sends studio-local times without an
/// offset, but older payloads carry RFC 3339 strings.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

impl Booking {
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.class.start_date_time.as_deref().and_then(parse_timestamp)
    }

    /// Class length in minutes, derived from the end time when the API omits it.
    pub fn duration_minutes(&self) -> Option<i64> {
        if let Some(d) = self.class.duration {
            return Some(d);
        }
        let start = self.start_time()?;
        let end = self.class.end_date_time.as_deref().and_then(parse_timestamp)?;
        let minutes = (end - start).num_minutes();
        (minutes > 0).then_some(minutes)
    }

    pub fn class_name(&self) -> &str {
        self.class.name.as_deref().unwrap_or("-")
    }

    pub fn studio_name(&self) -> &str {
        self.class
            .studio
            .as_ref()
            .and_then(|s| s.studio_name.as_deref())
            .unwrap_or("-")
    }

    pub fn coach_name(&self) -> String {
        let Some(coach) = self.class.coach.as_ref() else {
            return "-".to_string();
        };
        let name = format!(
            "{} {}",
            coach.first_name.as_deref().unwrap_or(""),
            coach.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            "-".to_string()
        } else {
            name.to_string()
        }
    }

    pub fn status_display(&self) -> &str {
        self.status.as_deref().unwrap_or("Unknown")
    }

    pub fn formatted_start(&self) -> String {
        match self.start_time() {
            Some(dt) => dt.format("%a %b %d, %I:%M %p").to_string(),
            None => self
                .class
                .start_date_time
                .clone()
                .unwrap_or_else(|| "TBD".to_string()),
        }
    }

    /// Flatten into one table row, cells ordered as `BOOKING_COLUMNS`.
    pub fn to_row(&self) -> [String; 6] {
        [
            self.formatted_start(),
            self.duration_minutes()
                .map(|m| format!("{} min", m))
                .unwrap_or_else(|| "-".to_string()),
            self.class_name().to_string(),
            self.studio_name().to_string(),
            self.coach_name(),
            self.status_display().to_string(),
        ]
    }
}

/// Sort bookings soonest first; entries without a parseable start go last.
pub fn sort_by_start(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| match (a.start_time(), b.start_time()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
