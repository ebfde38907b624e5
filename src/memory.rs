use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    calendar::ServiceCalendar,
    swipes::{
        repo::SwipeStore,
        repo_types::{Decision, SwipeId, SwipeRecord},
    },
    users::{
        repo::{CreateUserError, UserStore},
        repo_types::{NewUser, User},
    },
};

/// In-process user and swipe tables behind one lock.
///
/// Backs the service when `DATABASE_URL=memory` and every test that does not need Postgres.
/// Cloning shares the same tables.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    calendar: ServiceCalendar,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    swipes: Vec<SwipeRecord>,
    last_user_id: i64,
    last_swipe_id: SwipeId,
}

impl Tables {
    fn insert_swipe(
        &mut self,
        viewer_id: i64,
        target_id: i64,
        decision: Option<Decision>,
        created_at: OffsetDateTime,
    ) -> SwipeId {
        self.last_swipe_id += 1;
        self.swipes.push(SwipeRecord {
            id: self.last_swipe_id,
            viewer_id,
            target_id,
            decision,
            created_at,
        });
        self.last_swipe_id
    }
}

impl MemoryStore {
    pub fn new(calendar: ServiceCalendar) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            calendar,
        }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    /// Insert a swipe with an explicit timestamp.
    #[cfg(test)]
    pub fn seed_swipe(
        &self,
        viewer_id: i64,
        target_id: i64,
        decision: Option<Decision>,
        created_at: OffsetDateTime,
    ) -> SwipeId {
        self.lock()
            .expect("lock")
            .insert_swipe(viewer_id, target_id, decision, created_at)
    }

    /// Snapshot of every swipe made by `viewer_id`, oldest first.
    #[cfg(test)]
    pub fn swipes_by(&self, viewer_id: i64) -> Vec<SwipeRecord> {
        self.lock()
            .expect("lock")
            .swipes
            .iter()
            .filter(|s| s.viewer_id == viewer_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<i64, CreateUserError> {
        if let Some(field) = user.first_blank_field() {
            return Err(CreateUserError::BlankField(field));
        }
        let mut t = self.lock()?;
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(CreateUserError::UsernameTaken);
        }
        t.last_user_id += 1;
        let id = t.last_user_id;
        t.users.push(User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            gender: user.gender,
            date_of_birth: user.date_of_birth,
            profile_picture: user.profile_picture.clone(),
            is_upgraded: false,
        });
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let t = self.lock()?;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn set_upgraded(&self, id: i64) -> anyhow::Result<u64> {
        let mut t = self.lock()?;
        match t.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_upgraded = true;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn get_upgraded(&self, id: i64) -> anyhow::Result<Option<bool>> {
        let t = self.lock()?;
        Ok(t.users.iter().find(|u| u.id == id).map(|u| u.is_upgraded))
    }
}

#[async_trait]
impl SwipeStore for MemoryStore {
    async fn count_today_views(&self, viewer_id: i64) -> anyhow::Result<i64> {
        let day = self.calendar.today();
        let t = self.lock()?;
        let total = t
            .swipes
            .iter()
            .filter(|s| s.viewer_id == viewer_id && day.contains(s.created_at))
            .count();
        Ok(total as i64)
    }

    async fn find_unseen_opposite_gender_candidate(
        &self,
        viewer_id: i64,
    ) -> anyhow::Result<Option<User>> {
        let day = self.calendar.today();
        let t = self.lock()?;
        let Some(viewer) = t.users.iter().find(|u| u.id == viewer_id) else {
            return Ok(None);
        };
        let seen_today = |target_id: i64| {
            t.swipes.iter().any(|s| {
                s.viewer_id == viewer_id && s.target_id == target_id && day.contains(s.created_at)
            })
        };
        Ok(t
            .users
            .iter()
            .filter(|u| u.id != viewer.id && u.gender == viewer.gender.opposite())
            .find(|u| !seen_today(u.id))
            .cloned())
    }

    async fn create_pending_swipe(
        &self,
        viewer_id: i64,
        target_id: i64,
    ) -> anyhow::Result<SwipeId> {
        let mut t = self.lock()?;
        Ok(t.insert_swipe(viewer_id, target_id, None, OffsetDateTime::now_utc()))
    }

    async fn record_decision(
        &self,
        viewer_id: i64,
        target_id: i64,
        decision: Decision,
    ) -> anyhow::Result<u64> {
        let mut t = self.lock()?;
        let latest_pending = t
            .swipes
            .iter_mut()
            .filter(|s| s.viewer_id == viewer_id && s.target_id == target_id && s.is_pending())
            .max_by_key(|s| (s.created_at, s.id));
        match latest_pending {
            Some(swipe) => {
                swipe.decision = Some(decision);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
