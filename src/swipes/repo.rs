use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    calendar::ServiceCalendar,
    swipes::repo_types::{Decision, SwipeId},
    users::repo_types::{User, UserRow},
};

/// Persistence for swipe events, plus the "who is still unseen today" query.
#[async_trait]
pub trait SwipeStore: Send + Sync {
    /// Swipes created by `viewer_id` during the current service day, pending ones included.
    async fn count_today_views(&self, viewer_id: i64) -> anyhow::Result<i64>;

    /// Any user of the opposite gender to `viewer_id` that has no swipe from the viewer today.
    async fn find_unseen_opposite_gender_candidate(
        &self,
        viewer_id: i64,
    ) -> anyhow::Result<Option<User>>;

    /// Record that `target_id` was shown to `viewer_id`, decision unset.
    async fn create_pending_swipe(&self, viewer_id: i64, target_id: i64)
        -> anyhow::Result<SwipeId>;

    /// Set the decision on the viewer's latest pending swipe of `target_id`.
    /// Returns 0 when there is no pending swipe for the pair.
    async fn record_decision(
        &self,
        viewer_id: i64,
        target_id: i64,
        decision: Decision,
    ) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgSwipeStore {
    db: PgPool,
    calendar: ServiceCalendar,
}

impl PgSwipeStore {
    pub fn new(db: PgPool, calendar: ServiceCalendar) -> Self {
        Self { db, calendar }
    }
}

#[async_trait]
impl SwipeStore for PgSwipeStore {
    async fn count_today_views(&self, viewer_id: i64) -> anyhow::Result<i64> {
        let day = self.calendar.today();
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
              FROM swipes
             WHERE user_id = $1
               AND created_at >= $2
               AND created_at < $3
            "#,
        )
        .bind(viewer_id)
        .bind(day.start)
        .bind(day.end)
        .fetch_one(&self.db)
        .await
        .context("count today views")?;
        Ok(total)
    }

    async fn find_unseen_opposite_gender_candidate(
        &self,
        viewer_id: i64,
    ) -> anyhow::Result<Option<User>> {
        let day = self.calendar.today();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.user_id, u.username, u.email, u.phone_number, u.password, u.full_name,
                   u.gender, u.date_of_birth, u.profile_picture, u.is_upgraded
              FROM users u
              JOIN users v ON v.user_id = $1
             WHERE u.user_id <> v.user_id
               AND u.gender <> v.gender
               AND NOT EXISTS (
                   SELECT 1
                     FROM swipes s
                    WHERE s.user_id = v.user_id
                      AND s.target_user_id = u.user_id
                      AND s.created_at >= $2
                      AND s.created_at < $3
               )
             ORDER BY u.user_id
             LIMIT 1
            "#,
        )
        .bind(viewer_id)
        .bind(day.start)
        .bind(day.end)
        .fetch_optional(&self.db)
        .await
        .context("find unseen candidate")?;
        row.map(User::try_from).transpose()
    }

    async fn create_pending_swipe(
        &self,
        viewer_id: i64,
        target_id: i64,
    ) -> anyhow::Result<SwipeId> {
        let id: SwipeId = sqlx::query_scalar(
            r#"
            INSERT INTO swipes (user_id, target_user_id)
            VALUES ($1, $2)
            RETURNING swipe_id
            "#,
        )
        .bind(viewer_id)
        .bind(target_id)
        .fetch_one(&self.db)
        .await
        .context("insert pending swipe")?;
        Ok(id)
    }

    async fn record_decision(
        &self,
        viewer_id: i64,
        target_id: i64,
        decision: Decision,
    ) -> anyhow::Result<u64> {
        // Outer `swipe_action IS NULL` is re-checked after a concurrent writer commits.
        let result = sqlx::query(
            r#"
            UPDATE swipes
               SET swipe_action = $3
             WHERE swipe_action IS NULL
               AND swipe_id = (
                   SELECT swipe_id
                     FROM swipes
                    WHERE user_id = $1
                      AND target_user_id = $2
                      AND swipe_action IS NULL
                    ORDER BY created_at DESC, swipe_id DESC
                    LIMIT 1
               )
            "#,
        )
        .bind(viewer_id)
        .bind(target_id)
        .bind(decision.as_str())
        .execute(&self.db)
        .await
        .context("record swipe decision")?;
        Ok(result.rows_affected())
    }
}
