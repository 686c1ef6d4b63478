//! Multipart form validation for profile creation.
//!
//! Fields are checked one by one, in declaration order, and the first
//! invalid field rejects the whole request before any side effect.

use std::str::FromStr;
use std::sync::LazyLock;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use bytes::Bytes;
use chrono::{Datelike, NaiveDate, Utc};
use regex_lite::Regex;
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, ServerError};
use crate::profile::Gender;

/// Largest accepted avatar, in bytes.
pub const MAX_AVATAR_SIZE: usize = 1024 * 1024; // 1 MiB.
const MIN_BIRTH_YEAR: i32 = 1900;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z]+$").expect("invalid name pattern"));

/// Validated profile creation request.
#[derive(Clone, Debug)]
pub struct ProfileCreateRequest {
    /// Lower-cased on validation.
    pub first_name: String,
    /// Lower-cased on validation.
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    /// Trimmed of surrounding whitespace.
    pub info: String,
    pub avatar: Avatar,
}

/// Avatar upload accepted by the validator.
#[derive(Clone, Debug)]
pub struct Avatar {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Bytes,
}

/// Form fields as sent on the wire, before any validation.
#[derive(Debug, Default)]
struct RawForm {
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<String>,
    info: Option<String>,
    avatar: Option<(String, Bytes)>,
}

impl RawForm {
    async fn collect(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(parsing)? {
            match field.name() {
                Some("first_name") => {
                    form.first_name = Some(field.text().await.map_err(parsing)?);
                },
                Some("last_name") => {
                    form.last_name = Some(field.text().await.map_err(parsing)?);
                },
                Some("gender") => {
                    form.gender = Some(field.text().await.map_err(parsing)?);
                },
                Some("date_of_birth") => {
                    form.date_of_birth =
                        Some(field.text().await.map_err(parsing)?);
                },
                Some("info") => {
                    form.info = Some(field.text().await.map_err(parsing)?);
                },
                Some("avatar") => {
                    let filename =
                        field.file_name().unwrap_or("avatar").to_owned();
                    let content = field.bytes().await.map_err(parsing)?;
                    form.avatar = Some((filename, content));
                },
                _ => {},
            }
        }

        Ok(form)
    }

    /// Check every field, failing on the first invalid one.
    fn validate(self) -> Result<ProfileCreateRequest> {
        let first_name = validate_name("first_name", self.first_name)?;
        let last_name = validate_name("last_name", self.last_name)?;

        let gender = self
            .gender
            .ok_or_else(|| field_error("gender", "required", "Gender is required."))?;
        let gender = Gender::from_str(&gender).map_err(|()| {
            field_error("gender", "gender", "Gender must be either 'man' or 'woman'.")
        })?;

        let date_of_birth = self.date_of_birth.ok_or_else(|| {
            field_error("date_of_birth", "required", "Birth date is required.")
        })?;
        let date_of_birth = NaiveDate::from_str(&date_of_birth).map_err(|_| {
            field_error(
                "date_of_birth",
                "format",
                "Birth date must be an ISO 8601 date.",
            )
        })?;
        validate_birth_date(date_of_birth, Utc::now().date_naive())?;

        let info = self
            .info
            .ok_or_else(|| field_error("info", "required", "Info is required."))?;
        let info = info.trim();
        if info.is_empty() {
            return Err(field_error("info", "empty", "Info cannot be empty."));
        }

        let (filename, content) = self.avatar.ok_or_else(|| {
            field_error("avatar", "required", "Avatar image is required.")
        })?;
        let avatar = validate_image(filename, content)?;

        Ok(ProfileCreateRequest {
            first_name,
            last_name,
            gender,
            date_of_birth,
            info: info.to_owned(),
            avatar,
        })
    }
}

impl<S> FromRequest<S> for ProfileCreateRequest
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|err| ServerError::ParsingForm(Box::new(err)))?;

        RawForm::collect(multipart).await?.validate()
    }
}

fn parsing(err: MultipartError) -> ServerError {
    ServerError::ParsingForm(Box::new(err))
}

fn field_error(
    field: &'static str,
    code: &'static str,
    message: &'static str,
) -> ServerError {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new(code).with_message(message.into()));
    errors.into()
}

fn validate_name(field: &'static str, value: Option<String>) -> Result<String> {
    let value =
        value.ok_or_else(|| field_error(field, "required", "Name is required."))?;

    if !NAME_PATTERN.is_match(&value) {
        return Err(field_error(
            field,
            "name",
            "Name must contain only latin letters.",
        ));
    }

    Ok(value.to_lowercase())
}

fn validate_birth_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return Err(field_error(
            "date_of_birth",
            "birth_date",
            "Birth date cannot be in the future.",
        ));
    }

    if date.year() < MIN_BIRTH_YEAR {
        return Err(field_error(
            "date_of_birth",
            "birth_date",
            "Birth year must be 1900 or later.",
        ));
    }

    Ok(())
}

fn validate_image(filename: String, content: Bytes) -> Result<Avatar> {
    if content.len() > MAX_AVATAR_SIZE {
        return Err(field_error("avatar", "image", "Image must be at most 1 MB."));
    }

    let Some(content_type) = detect_image(&content) else {
        return Err(field_error("avatar", "image", "Image must be PNG or JPEG."));
    };

    Ok(Avatar {
        filename,
        content_type,
        content,
    })
}

fn detect_image(data: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if data.starts_with(PNG) {
        Some("image/png")
    } else if data.starts_with(JPEG) {
        Some("image/jpeg")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn valid_form() -> RawForm {
        RawForm {
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            gender: Some("man".into()),
            date_of_birth: Some("1990-01-01".into()),
            info: Some(" hello ".into()),
            avatar: Some(("cat.png".into(), Bytes::from_static(PNG_HEADER))),
        }
    }

    fn failing_field(form: RawForm) -> String {
        match form.validate() {
            Err(ServerError::Validation(errors)) => {
                let fields: Vec<_> =
                    errors.field_errors().keys().cloned().collect();
                assert_eq!(fields.len(), 1);
                fields[0].to_string()
            },
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let request = valid_form().validate().unwrap();

        assert_eq!(request.first_name, "john");
        assert_eq!(request.last_name, "doe");
        assert_eq!(request.gender, Gender::Man);
        assert_eq!(request.info, "hello");
        assert_eq!(request.avatar.content_type, "image/png");
        assert_eq!(request.avatar.filename, "cat.png");
    }

    #[test]
    fn test_name_with_digits_is_rejected() {
        let mut form = valid_form();
        form.first_name = Some("John3".into());
        assert_eq!(failing_field(form), "first_name");
    }

    #[test]
    fn test_unknown_gender_is_rejected() {
        let mut form = valid_form();
        form.gender = Some("unspecified".into());
        assert_eq!(failing_field(form), "gender");
    }

    #[test]
    fn test_birth_date_in_future_is_rejected() {
        let mut form = valid_form();
        form.date_of_birth = Some("2999-01-01".into());
        assert_eq!(failing_field(form), "date_of_birth");
    }

    #[test]
    fn test_birth_date_before_1900_is_rejected() {
        let mut form = valid_form();
        form.date_of_birth = Some("1899-12-31".into());
        assert_eq!(failing_field(form), "date_of_birth");
    }

    #[test]
    fn test_unparsable_birth_date_is_rejected() {
        let mut form = valid_form();
        form.date_of_birth = Some("01/01/1990".into());
        assert_eq!(failing_field(form), "date_of_birth");
    }

    #[test]
    fn test_whitespace_only_info_is_rejected() {
        let mut form = valid_form();
        form.info = Some("   ".into());
        assert_eq!(failing_field(form), "info");
    }

    #[test]
    fn test_jpeg_avatar_is_accepted() {
        let mut form = valid_form();
        form.avatar =
            Some(("me.jpg".into(), Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0])));

        let request = form.validate().unwrap();
        assert_eq!(request.avatar.content_type, "image/jpeg");
    }

    #[test]
    fn test_unknown_image_format_is_rejected() {
        let mut form = valid_form();
        form.avatar = Some(("note.txt".into(), Bytes::from_static(b"hello")));
        assert_eq!(failing_field(form), "avatar");
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        let mut content = PNG_HEADER.to_vec();
        content.resize(MAX_AVATAR_SIZE + 1, 0);

        let mut form = valid_form();
        form.avatar = Some(("big.png".into(), Bytes::from(content)));
        assert_eq!(failing_field(form), "avatar");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut form = valid_form();
        form.info = None;
        assert_eq!(failing_field(form), "info");
    }

    #[test]
    fn test_first_invalid_field_wins() {
        let mut form = valid_form();
        form.last_name = Some("D0e".into());
        form.gender = Some("unspecified".into());
        // `last_name` is checked before `gender`.
        assert_eq!(failing_field(form), "last_name");
    }
}
