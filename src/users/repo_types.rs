use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;

/// Binary gender model used for candidate matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn opposite(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => anyhow::bail!("unknown gender {other:?}"),
        }
    }
}

/// User record as the rest of the service sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String, // argon2 PHC string
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: Date,
    pub profile_picture: String,
    pub is_upgraded: bool,
}

/// Raw `users` row; gender is stored as text.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub full_name: String,
    pub gender: String,
    pub date_of_birth: Date,
    pub profile_picture: String,
    pub is_upgraded: bool,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.user_id,
            gender: r.gender.parse()?,
            username: r.username,
            email: r.email,
            phone_number: r.phone_number,
            password_hash: r.password,
            full_name: r.full_name,
            date_of_birth: r.date_of_birth,
            profile_picture: r.profile_picture,
            is_upgraded: r.is_upgraded,
        })
    }
}

/// A fully validated registration, ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: Date,
    pub profile_picture: String,
}

impl NewUser {
    /// Names the first required text field that is empty, if any.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("username", &self.username),
            ("email", &self.email),
            ("phoneNumber", &self.phone_number),
            ("password", &self.password_hash),
            ("fullName", &self.full_name),
            ("profilePicture", &self.profile_picture),
        ]
        .into_iter()
        .find(|(_, v)| v.is_empty())
        .map(|(name, _)| name)
    }
}
