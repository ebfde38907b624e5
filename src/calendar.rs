use time::{Duration, OffsetDateTime, UtcOffset};

/// Calendar days as seen from the service's reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceCalendar {
    offset: UtcOffset,
}

/// Half-open `[start, end)` window covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DayWindow {
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        at >= self.start && at < self.end
    }
}

impl ServiceCalendar {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn from_hours(hours: i8) -> anyhow::Result<Self> {
        let offset = UtcOffset::from_hms(hours, 0, 0)
            .map_err(|e| anyhow::anyhow!("invalid utc offset {hours}h: {e}"))?;
        Ok(Self::new(offset))
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn today(&self) -> DayWindow {
        self.day_of(OffsetDateTime::now_utc())
    }

    pub fn day_of(&self, at: OffsetDateTime) -> DayWindow {
        let local = at.to_offset(self.offset);
        let start = local.date().midnight().assume_offset(self.offset);
        DayWindow {
            start,
            end: start + Duration::DAY,
        }
    }
}

impl Default for ServiceCalendar {
    fn default() -> Self {
        // Asia/Jakarta
        Self::new(UtcOffset::from_whole_seconds(7 * 3600).unwrap_or(UtcOffset::UTC))
    }
}
