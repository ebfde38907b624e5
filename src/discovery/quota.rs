/// Outcome of the daily discovery allowance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Denied,
}

/// Free accounts get `daily_limit` discoveries per service day; upgraded ones are unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub daily_limit: u32,
}

impl QuotaPolicy {
    pub fn new(daily_limit: u32) -> Self {
        Self { daily_limit }
    }

    pub fn evaluate(&self, upgraded: bool, views_today: i64) -> QuotaDecision {
        if upgraded || views_today < i64::from(self.daily_limit) {
            QuotaDecision::Allowed
        } else {
            QuotaDecision::Denied
        }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}
