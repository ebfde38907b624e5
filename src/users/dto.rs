use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};

use crate::{
    error::AppError,
    users::repo_types::{Gender, NewUser, User},
};

/// `YYYY-MM-DD`, and it has to be a real calendar date.
pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

fn required(field: &'static str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Request body for user registration. Missing fields deserialize as empty and fail validation.
/// Values are stored exactly as sent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub full_name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub profile_picture: String,
}

/// A registration that passed validation; the password is still plain.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: Date,
    pub profile_picture: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, AppError> {
        required("username", &self.username)?;
        required("email", &self.email)?;
        required("phoneNumber", &self.phone_number)?;
        required("password", &self.password)?;
        required("fullName", &self.full_name)?;
        required("gender", &self.gender)?;
        required("dateOfBirth", &self.date_of_birth)?;
        required("profilePicture", &self.profile_picture)?;

        let gender: Gender = self
            .gender
            .parse()
            .map_err(|_| AppError::validation("gender must be one of male, female"))?;
        let date_of_birth = parse_date(&self.date_of_birth)
            .ok_or_else(|| AppError::validation("dateOfBirth must be a YYYY-MM-DD date"))?;

        Ok(Registration {
            username: self.username,
            email: self.email,
            phone_number: self.phone_number,
            password: self.password,
            full_name: self.full_name,
            gender,
            date_of_birth,
            profile_picture: self.profile_picture,
        })
    }
}

impl Registration {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            username: self.username,
            email: self.email,
            phone_number: self.phone_number,
            password_hash,
            full_name: self.full_name,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            profile_picture: self.profile_picture,
        }
    }
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        required("username", &self.username)?;
        required("password", &self.password)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub user_id: i64,
}

/// Profile returned to the account owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: String,
    pub is_upgraded: bool,
    pub profile_picture: String,
}

impl From<User> for UserData {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            username: u.username,
            email: u.email,
            phone_number: u.phone_number,
            full_name: u.full_name,
            gender: u.gender,
            date_of_birth: u.date_of_birth.to_string(),
            is_upgraded: u.is_upgraded,
            profile_picture: u.profile_picture,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(flatten)]
    pub user: UserData,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn valid() -> RegisterRequest {
        RegisterRequest {
            username: "rina".into(),
            email: "Rina@Example.com".into(),
            phone_number: "081299998888".into(),
            password: "hunter22".into(),
            full_name: "Rina Putri".into(),
            gender: "female".into(),
            date_of_birth: "1999-04-30".into(),
            profile_picture: "https://cdn.example.com/rina.jpg".into(),
        }
    }

    fn validation_message(req: RegisterRequest) -> String {
        match req.validate() {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_registration_keeps_values_verbatim() {
        let reg = valid().validate().unwrap();
        assert_eq!(reg.email, "Rina@Example.com");
        assert_eq!(reg.gender, Gender::Female);
        assert_eq!(reg.date_of_birth, date!(1999 - 04 - 30));
    }

    #[test]
    fn email_has_no_format_rule() {
        let mut req = valid();
        req.email = "bob@localhost".into();
        assert_eq!(req.validate().unwrap().email, "bob@localhost");
    }

    #[test]
    fn every_field_is_required() {
        let mut req = valid();
        req.profile_picture = String::new();
        assert!(validation_message(req).contains("profilePicture"));

        let mut req = valid();
        req.phone_number = String::new();
        assert!(validation_message(req).contains("phoneNumber"));
    }

    #[test]
    fn whitespace_counts_as_a_value() {
        let mut req = valid();
        req.password = "   ".into();
        req.username = " rina ".into();
        let reg = req.validate().unwrap();
        assert_eq!(reg.password, "   ");
        assert_eq!(reg.username, " rina ");
    }

    #[test]
    fn gender_must_match_exactly() {
        for bad in ["other", "Female", " female", "female "] {
            let mut req = valid();
            req.gender = bad.into();
            assert!(validation_message(req).contains("gender"), "{bad:?}");
        }
    }

    #[test]
    fn date_of_birth_must_be_a_real_date() {
        for bad in ["1999-02-30", "30-04-1999", "1999/04/30", "yesterday"] {
            let mut req = valid();
            req.date_of_birth = bad.into();
            assert!(validation_message(req).contains("dateOfBirth"), "{bad}");
        }
    }

    #[test]
    fn user_data_uses_wire_names() {
        let data = UserData::from(User {
            id: 4,
            username: "rina".into(),
            email: "rina@example.com".into(),
            phone_number: "0812".into(),
            password_hash: "secret-hash".into(),
            full_name: "Rina".into(),
            gender: Gender::Female,
            date_of_birth: date!(1999 - 04 - 30),
            profile_picture: "r.jpg".into(),
            is_upgraded: true,
        });
        let json = serde_json::to_value(LoginData {
            user: data,
            access_token: "tok".into(),
        })
        .unwrap();
        assert_eq!(json["userId"], 4);
        assert_eq!(json["dateOfBirth"], "1999-04-30");
        assert_eq!(json["gender"], "female");
        assert_eq!(json["isUpgraded"], true);
        assert_eq!(json["accessToken"], "tok");
        assert!(!json.to_string().contains("secret-hash"));
    }
}
