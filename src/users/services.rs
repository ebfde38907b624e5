use tracing::{info, instrument};

use crate::{
    auth::{
        claims::{JwtKeys, UserInfo},
        password::{hash_password, verify_against_dummy, verify_password},
    },
    error::AppError,
    users::{
        dto::{LoginData, Registration, UserData},
        repo::UserStore,
        repo_types::User,
    },
};

#[instrument(skip_all, fields(username = %registration.username))]
pub async fn register(users: &dyn UserStore, registration: Registration) -> Result<i64, AppError> {
    // A duplicate that slips past this lookup is still refused by the store.
    if users
        .find_by_username(&registration.username)
        .await
        .map_err(AppError::Persistence)?
        .is_some()
    {
        return Err(AppError::UsernameTaken);
    }

    let hash = hash_password(&registration.password).map_err(AppError::Internal)?;
    let id = users
        .create_user(&registration.into_new_user(hash))
        .await?;

    info!(user_id = id, "user registered");
    Ok(id)
}

/// Exact username match plus argon2 verification. A wrong password and an unknown
/// username are the same `None`.
pub async fn find_by_username_and_password(
    users: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = users
        .find_by_username(username)
        .await
        .map_err(AppError::Persistence)?
    else {
        verify_against_dummy(password);
        return Ok(None);
    };
    let ok = verify_password(password, &user.password_hash).map_err(AppError::Internal)?;
    Ok(ok.then_some(user))
}

#[instrument(skip_all, fields(username = %username))]
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    username: &str,
    password: &str,
) -> Result<LoginData, AppError> {
    let user = find_by_username_and_password(users, username, password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let access_token = keys
        .sign(UserInfo {
            id: user.id,
            username: user.username.clone(),
            name: user.full_name.clone(),
            mobile: user.phone_number.clone(),
            email: user.email.clone(),
            ..Default::default()
        })
        .map_err(AppError::Internal)?;

    info!(user_id = user.id, "user logged in");
    Ok(LoginData {
        user: UserData::from(user),
        access_token,
    })
}

#[instrument(skip(users))]
pub async fn upgrade_account(users: &dyn UserStore, id: i64) -> Result<(), AppError> {
    let affected = users
        .set_upgraded(id)
        .await
        .map_err(AppError::Persistence)?;
    if affected == 0 {
        return Err(AppError::NotFound("user"));
    }
    info!(user_id = id, "account upgraded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calendar::ServiceCalendar,
        config::JwtConfig,
        memory::MemoryStore,
        users::{
            repo::CreateUserError,
            repo_types::{Gender, NewUser},
        },
    };
    use async_trait::async_trait;
    use time::macros::date;

    fn registration(username: &str, password: &str) -> Registration {
        Registration {
            username: username.into(),
            email: format!("{username}@example.com"),
            phone_number: "081200001111".into(),
            password: password.into(),
            full_name: "Some One".into(),
            gender: Gender::Male,
            date_of_birth: date!(1990 - 01 - 02),
            profile_picture: "p.jpg".into(),
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: "s".into(),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_minutes: 5,
        })
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let store = MemoryStore::new(ServiceCalendar::default());
        register(&store, registration("budi", "pw-budi")).await.unwrap();
        let stored = store.find_by_username("budi").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw-budi");
        assert!(verify_password("pw-budi", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_refused() {
        let store = MemoryStore::new(ServiceCalendar::default());
        register(&store, registration("budi", "a")).await.unwrap();
        let err = register(&store, registration("budi", "b")).await.unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken));
    }

    /// Lookups never see existing users, like a registration that lost the race to another.
    struct StaleLookups(MemoryStore);

    #[async_trait]
    impl UserStore for StaleLookups {
        async fn create_user(&self, user: &NewUser) -> Result<i64, CreateUserError> {
            self.0.create_user(user).await
        }

        async fn find_by_username(&self, _: &str) -> anyhow::Result<Option<User>> {
            Ok(None)
        }

        async fn set_upgraded(&self, id: i64) -> anyhow::Result<u64> {
            self.0.set_upgraded(id).await
        }

        async fn get_upgraded(&self, id: i64) -> anyhow::Result<Option<bool>> {
            self.0.get_upgraded(id).await
        }
    }

    #[tokio::test]
    async fn duplicate_caught_at_insert_is_username_taken() {
        let users = StaleLookups(MemoryStore::new(ServiceCalendar::default()));
        register(&users, registration("budi", "a")).await.unwrap();
        let err = register(&users, registration("budi", "b")).await.unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken));
    }

    #[tokio::test]
    async fn empty_field_refused_by_store_is_validation() {
        let store = MemoryStore::new(ServiceCalendar::default());
        let mut reg = registration("budi", "pw");
        reg.phone_number = String::new();
        let err = register(&store, reg).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("phoneNumber")));
        assert!(store.find_by_username("budi").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn credential_lookup_is_exact() {
        let store = MemoryStore::new(ServiceCalendar::default());
        register(&store, registration("budi", "secret")).await.unwrap();

        assert!(find_by_username_and_password(&store, "budi", "secret")
            .await
            .unwrap()
            .is_some());
        assert!(find_by_username_and_password(&store, "budi", "Secret")
            .await
            .unwrap()
            .is_none());
        assert!(find_by_username_and_password(&store, "Budi", "secret")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn login_issues_token_for_the_user() {
        let store = MemoryStore::new(ServiceCalendar::default());
        let id = register(&store, registration("budi", "secret")).await.unwrap();
        let keys = keys();

        let data = login(&store, &keys, "budi", "secret").await.unwrap();
        assert_eq!(data.user.user_id, id);
        assert!(!data.user.is_upgraded);
        assert_eq!(keys.verify(&data.access_token).unwrap().user.id, id);

        let err = login(&store, &keys, "budi", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn upgrade_unknown_user_is_not_found() {
        let store = MemoryStore::new(ServiceCalendar::default());
        let id = register(&store, registration("budi", "x")).await.unwrap();
        upgrade_account(&store, id).await.unwrap();
        assert_eq!(store.get_upgraded(id).await.unwrap(), Some(true));
        assert!(matches!(
            upgrade_account(&store, id + 1).await.unwrap_err(),
            AppError::NotFound("user")
        ));
    }
}
