mod form;
mod repository;

pub use form::*;
pub use repository::*;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User profile as saved on database.
///
/// `avatar` holds the object storage key; responses replace it with a
/// retrievable URL.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: chrono::NaiveDate,
    pub info: String,
    pub avatar: String,
}

/// Profile fields before insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProfile {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: chrono::NaiveDate,
    pub info: String,
    pub avatar: String,
}

/// Declared gender of a profile.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Man,
    Woman,
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "man" => Ok(Gender::Man),
            "woman" => Ok(Gender::Woman),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_from_str() {
        assert_eq!("man".parse(), Ok(Gender::Man));
        assert_eq!("woman".parse(), Ok(Gender::Woman));
        assert!(Gender::from_str("unspecified").is_err());
        assert!(Gender::from_str("MAN").is_err());
    }

    #[test]
    fn test_gender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Gender::Woman).unwrap(), "\"woman\"");
    }
}
