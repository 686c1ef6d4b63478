//! Instance status endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::config::Configuration;

/// Expose public instance metadata.
///
/// Secret sections are skipped during serialization.
pub async fn status(
    State(config): State<Arc<Configuration>>,
) -> Json<Configuration> {
    Json((*config).clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};
    use bytes::Bytes;
    use http_body_util::BodyExt;

    use crate::error::Result;
    use crate::profile::{NewProfile, Profile, ProfileRepository};
    use crate::storage::ObjectStorage;
    use crate::user::{User, UserRepository};
    use crate::{AppState, app, config, make_request, token};

    struct Stub;

    #[async_trait]
    impl UserRepository for Stub {
        async fn find_by_id(&self, _user_id: i64) -> Result<Option<User>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl ProfileRepository for Stub {
        async fn find_by_user_id(&self, _user_id: i64) -> Result<Option<Profile>> {
            Ok(None)
        }

        async fn insert(&self, _profile: &NewProfile) -> Result<Profile> {
            Ok(Profile::default())
        }
    }

    #[async_trait]
    impl ObjectStorage for Stub {
        async fn upload(
            &self,
            _key: &str,
            _data: Bytes,
            _content_type: &str,
        ) -> Result<()> {
            Ok(())
        }

        fn file_url(&self, _key: &str) -> String {
            String::default()
        }
    }

    #[tokio::test]
    async fn test_status_hides_secret_sections() {
        let state = AppState {
            config: Arc::new(config::Configuration::default()),
            token: token::tests::manager(),
            users: Arc::new(Stub),
            profiles: Arc::new(Stub),
            storage: Arc::new(Stub),
        };

        let response = make_request(
            app(state),
            Method::GET,
            "/status.json",
            "",
            None,
            Bytes::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body.get("name").is_some());
        assert!(body.get("version").is_some());
        assert!(body.get("postgres").is_none());
        assert!(body.get("token").is_none());
        assert!(body.get("s3").is_none());
    }
}
