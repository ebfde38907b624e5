use crate::{swipes::repo::SwipeStore, users::repo_types::User};

/// Picks the next profile to show. Not serialized against the quota check: two concurrent
/// discoveries may both pass and may both get the same candidate.
pub struct CandidateSelector<'a> {
    swipes: &'a dyn SwipeStore,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(swipes: &'a dyn SwipeStore) -> Self {
        Self { swipes }
    }

    pub async fn next_for(&self, viewer_id: i64) -> anyhow::Result<Option<User>> {
        self.swipes
            .find_unseen_opposite_gender_candidate(viewer_id)
            .await
    }
}
