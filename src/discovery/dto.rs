use serde::Serialize;

use crate::users::repo_types::{Gender, User};

/// Profile shown to a viewer during discovery. The upgrade flag stays private.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUserData {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: String,
    pub profile_picture: String,
}

impl From<User> for TargetUserData {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            username: u.username,
            email: u.email,
            phone_number: u.phone_number,
            full_name: u.full_name,
            gender: u.gender,
            date_of_birth: u.date_of_birth.to_string(),
            profile_picture: u.profile_picture,
        }
    }
}
