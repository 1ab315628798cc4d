use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::models::SessionClaims;

/// Verifies access tokens issued by the auth service (HS256, shared secret).
///
/// Expiry is not enforced here: an expired but authentic token still has to
/// reach the refresh path. Callers check `exp` themselves.
#[derive(Clone)]
pub struct JwtUtil {
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtUtil {
    /// An empty secret yields a verifier that rejects every token.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let decoding_key =
            (!secret.is_empty()).then(|| DecodingKey::from_secret(secret.as_bytes()));
        Self { decoding_key, validation }
    }

    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| JwtError::from(ErrorKind::InvalidKeyFormat))?;
        decode::<SessionClaims>(token, key, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{TEST_JWT_SECRET, make_access_token, make_forged_token};

    #[test]
    fn test_verify_valid_token() {
        let jwt = JwtUtil::new(TEST_JWT_SECRET);
        let claims = jwt.verify_token(&make_access_token("user-1", 60)).expect("valid token");
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn test_expired_token_still_verifies() {
        let jwt = JwtUtil::new(TEST_JWT_SECRET);
        let claims = jwt.verify_token(&make_access_token("user-1", -600)).expect("authentic token");
        assert!(claims.is_expired(chrono::Utc::now().timestamp()));
    }

    #[test]
    fn test_forged_token_rejected() {
        let jwt = JwtUtil::new(TEST_JWT_SECRET);
        assert!(jwt.verify_token(&make_forged_token("admin", 3600)).is_err());
        assert!(jwt.verify_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_empty_secret_trusts_nothing() {
        let jwt = JwtUtil::new("");
        assert!(jwt.verify_token(&make_access_token("user-1", 60)).is_err());
    }
}
