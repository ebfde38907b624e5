use tracing::{info, instrument};

use crate::{error::AppError, swipes::dto::DecisionCommand, swipes::repo::SwipeStore};

/// Settle a pending swipe. Zero affected rows means the target was never shown to the
/// viewer, or the swipe is already decided.
#[instrument(skip(swipes), fields(viewer_id = cmd.viewer_id, target_id = cmd.target_id))]
pub async fn decide(swipes: &dyn SwipeStore, cmd: DecisionCommand) -> Result<(), AppError> {
    let affected = swipes
        .record_decision(cmd.viewer_id, cmd.target_id, cmd.decision)
        .await
        .map_err(AppError::Persistence)?;
    if affected == 0 {
        return Err(AppError::DecisionConflict);
    }
    info!(decision = %cmd.decision, "swipe decided");
    Ok(())
}
