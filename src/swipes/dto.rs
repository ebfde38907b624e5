use serde::Deserialize;

use crate::{error::AppError, swipes::repo_types::Decision};

/// Request body for `PUT /swipe`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwipeRequest {
    pub id: i64,
    pub target_id: i64,
    pub action: String,
}

/// A decision that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionCommand {
    pub viewer_id: i64,
    pub target_id: i64,
    pub decision: Decision,
}

impl SwipeRequest {
    pub fn validate(&self) -> Result<DecisionCommand, AppError> {
        if self.id <= 0 {
            return Err(AppError::validation("id is required"));
        }
        if self.target_id <= 0 {
            return Err(AppError::validation("targetId is required"));
        }
        let decision = self
            .action
            .parse::<Decision>()
            .map_err(|_| AppError::validation("action must be one of like, pass"))?;
        Ok(DecisionCommand {
            viewer_id: self.id,
            target_id: self.target_id,
            decision,
        })
    }
}
