use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Terminal decision recorded against a pending swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Like,
    Pass,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Like => "like",
            Decision::Pass => "pass",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Decision::Like),
            "pass" => Ok(Decision::Pass),
            other => anyhow::bail!("unknown swipe action {other:?}"),
        }
    }
}

/// Handle of a persisted swipe row.
pub type SwipeId = i64;

/// One "viewer was shown target" event; `decision` stays `None` while pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeRecord {
    pub id: SwipeId,
    pub viewer_id: i64,
    pub target_id: i64,
    pub decision: Option<Decision>,
    pub created_at: OffsetDateTime,
}

impl SwipeRecord {
    pub fn is_pending(&self) -> bool {
        self.decision.is_none()
    }
}
