use std::fmt;

use tracing::{debug, info, instrument};

use crate::{
    discovery::{
        quota::{QuotaDecision, QuotaPolicy},
        selector::CandidateSelector,
    },
    error::AppError,
    swipes::repo::SwipeStore,
    users::{repo::UserStore, repo_types::User},
};

/// Steps of one discovery request, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckingQuota,
    SelectingCandidate,
    RecordingPendingSwipe,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::CheckingQuota => "checking_quota",
            Stage::SelectingCandidate => "selecting_candidate",
            Stage::RecordingPendingSwipe => "recording_pending_swipe",
        })
    }
}

fn store_failure(stage: Stage) -> impl FnOnce(anyhow::Error) -> AppError {
    move |e| AppError::Persistence(e.context(format!("discovery failed while {stage}")))
}

/// Quota check, candidate selection, then a pending swipe so the candidate counts as shown.
///
/// A failed pending-swipe write leaves nothing behind, so a retry may surface the same
/// candidate again. Nothing is rolled back once the write succeeds.
#[instrument(skip(users, swipes, policy))]
pub async fn discover(
    users: &dyn UserStore,
    swipes: &dyn SwipeStore,
    policy: QuotaPolicy,
    viewer_id: i64,
) -> Result<User, AppError> {
    let upgraded = users
        .get_upgraded(viewer_id)
        .await
        .map_err(store_failure(Stage::CheckingQuota))?
        .ok_or(AppError::NotFound("user"))?;
    if !upgraded {
        let views_today = swipes
            .count_today_views(viewer_id)
            .await
            .map_err(store_failure(Stage::CheckingQuota))?;
        debug!(views_today, limit = policy.daily_limit, "quota read");
        if policy.evaluate(upgraded, views_today) == QuotaDecision::Denied {
            return Err(AppError::QuotaExceeded {
                limit: policy.daily_limit,
            });
        }
    }

    let candidate = CandidateSelector::new(swipes)
        .next_for(viewer_id)
        .await
        .map_err(store_failure(Stage::SelectingCandidate))?
        .ok_or(AppError::NoCandidateAvailable)?;

    let swipe_id = swipes
        .create_pending_swipe(viewer_id, candidate.id)
        .await
        .map_err(store_failure(Stage::RecordingPendingSwipe))?;

    info!(target_id = candidate.id, swipe_id, "candidate shown");
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calendar::ServiceCalendar,
        memory::MemoryStore,
        swipes::repo_types::{Decision, SwipeId},
        users::repo_types::{Gender, NewUser},
    };
    use async_trait::async_trait;
    use time::macros::date;

    async fn user(store: &MemoryStore, username: &str, gender: Gender) -> i64 {
        store
            .create_user(&NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                phone_number: "081300000000".into(),
                password_hash: "$argon2id$placeholder".into(),
                full_name: username.into(),
                gender,
                date_of_birth: date!(1997 - 07 - 07),
                profile_picture: format!("{username}.jpg"),
            })
            .await
            .unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new(ServiceCalendar::default())
    }

    #[tokio::test]
    async fn surfaces_opposite_gender_and_records_pending_swipe() {
        let store = store();
        let viewer = user(&store, "ayu", Gender::Female).await;
        user(&store, "sari", Gender::Female).await;
        let bima = user(&store, "bima", Gender::Male).await;

        let got = discover(&store, &store, QuotaPolicy::default(), viewer)
            .await
            .unwrap();
        assert_eq!(got.id, bima);

        let swipes = store.swipes_by(viewer);
        assert_eq!(swipes.len(), 1);
        assert_eq!(swipes[0].target_id, bima);
        assert!(swipes[0].is_pending());
    }

    #[tokio::test]
    async fn pool_exhausts_within_a_day() {
        let store = store();
        let viewer = user(&store, "ayu", Gender::Female).await;
        let a = user(&store, "a", Gender::Male).await;
        let b = user(&store, "b", Gender::Male).await;

        let first = discover(&store, &store, QuotaPolicy::default(), viewer).await.unwrap();
        let second = discover(&store, &store, QuotaPolicy::default(), viewer).await.unwrap();
        let mut shown = vec![first.id, second.id];
        shown.sort();
        assert_eq!(shown, vec![a, b]);

        let err = discover(&store, &store, QuotaPolicy::default(), viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCandidateAvailable));
        assert_eq!(store.swipes_by(viewer).len(), 2);
    }

    #[tokio::test]
    async fn free_account_denied_at_limit_without_new_swipe() {
        let store = store();
        let viewer = user(&store, "ayu", Gender::Female).await;
        user(&store, "fresh", Gender::Male).await;
        for target in 100..110 {
            store.create_pending_swipe(viewer, target).await.unwrap();
        }

        let err = discover(&store, &store, QuotaPolicy::default(), viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { limit: 10 }));
        assert_eq!(store.count_today_views(viewer).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn upgraded_account_ignores_limit() {
        let store = store();
        let viewer = user(&store, "ayu", Gender::Female).await;
        let fresh = user(&store, "fresh", Gender::Male).await;
        for target in 100..130 {
            store.create_pending_swipe(viewer, target).await.unwrap();
        }
        store.set_upgraded(viewer).await.unwrap();

        let got = discover(&store, &store, QuotaPolicy::default(), viewer)
            .await
            .unwrap();
        assert_eq!(got.id, fresh);
    }

    #[tokio::test]
    async fn unknown_viewer_is_not_found() {
        let store = store();
        user(&store, "bima", Gender::Male).await;
        let err = discover(&store, &store, QuotaPolicy::default(), 77)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("user")));
    }

    #[tokio::test]
    async fn decided_candidates_stay_hidden_the_same_day() {
        let store = store();
        let viewer = user(&store, "ayu", Gender::Female).await;
        let bima = user(&store, "bima", Gender::Male).await;

        discover(&store, &store, QuotaPolicy::default(), viewer).await.unwrap();
        store.record_decision(viewer, bima, Decision::Like).await.unwrap();
        assert!(matches!(
            discover(&store, &store, QuotaPolicy::default(), viewer)
                .await
                .unwrap_err(),
            AppError::NoCandidateAvailable
        ));
    }

    /// Reads go to the inner store; the pending-swipe write always fails.
    struct BrokenWrites(MemoryStore);

    #[async_trait]
    impl SwipeStore for BrokenWrites {
        async fn count_today_views(&self, viewer_id: i64) -> anyhow::Result<i64> {
            self.0.count_today_views(viewer_id).await
        }

        async fn find_unseen_opposite_gender_candidate(
            &self,
            viewer_id: i64,
        ) -> anyhow::Result<Option<User>> {
            self.0.find_unseen_opposite_gender_candidate(viewer_id).await
        }

        async fn create_pending_swipe(&self, _: i64, _: i64) -> anyhow::Result<SwipeId> {
            anyhow::bail!("connection reset")
        }

        async fn record_decision(&self, v: i64, t: i64, d: Decision) -> anyhow::Result<u64> {
            self.0.record_decision(v, t, d).await
        }
    }

    #[tokio::test]
    async fn failed_write_is_persistence_error_and_candidate_can_resurface() {
        let store = store();
        let viewer = user(&store, "ayu", Gender::Female).await;
        let bima = user(&store, "bima", Gender::Male).await;
        let broken = BrokenWrites(store.clone());

        let err = discover(&store, &broken, QuotaPolicy::default(), viewer)
            .await
            .unwrap_err();
        match err {
            AppError::Persistence(e) => {
                assert!(format!("{e:#}").contains("recording_pending_swipe"))
            }
            other => panic!("expected persistence error, got {other:?}"),
        }

        let retry = discover(&store, &store, QuotaPolicy::default(), viewer)
            .await
            .unwrap();
        assert_eq!(retry.id, bima);
    }
}
