//! API handlers for the picture service.

pub mod pictures;

pub use pictures::*;

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::directory::ProductionDirectory;
use crate::thumbnail::ImageStore;
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;

/// Shared application state.
pub struct AppState {
    /// Entity and permission lookups, provided by the tracker.
    pub directory: Arc<dyn ProductionDirectory>,
    /// Content store for pictures.
    pub store: ImageStore,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// JWT encoding key (token minting for local runs and tests).
    pub encoding_key: EncodingKey,
    /// Token expiry in seconds.
    pub token_expiry: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        directory: Arc<dyn ProductionDirectory>,
        store: ImageStore,
        jwt_secret: &str,
        max_upload_size: u64,
        token_expiry: u64,
    ) -> Self {
        Self {
            directory,
            store,
            max_upload_size,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry,
        }
    }

    /// Generate a bearer token for a person.
    ///
    /// The tracker normally issues tokens; this is used by local runs and
    /// integration tests.
    pub fn generate_token(&self, person_id: Uuid) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: person_id,
            iat: now,
            exp: now + self.token_expiry,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to generate token: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
