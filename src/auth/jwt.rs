use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState, users::repo_types::UserId};

/// Signing and verification keys, built once from config at startup.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.max(0) as u64 * 60),
        }
    }

    pub fn sign(&self, user_id: UserId) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            authorized: true,
            user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if !data.claims.authorized {
            anyhow::bail!("token is not authorized");
        }
        debug!(user_id = data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 6 * 60,
        })
    }

    fn encode_claims(keys: &JwtKeys, claims: &Claims) -> String {
        encode(&Header::default(), claims, &keys.encoding).expect("encode")
    }

    #[test]
    fn sign_and_verify_yields_same_user() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys.sign(42).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id, 42);
        assert!(claims.authorized);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn token_lives_six_hours() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let claims = keys.verify(&keys.sign(1).expect("sign")).expect("verify");
        assert_eq!(claims.exp - claims.iat, 6 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(7);
        let claims = Claims {
            authorized: true,
            user_id: 7,
            iat: issued.unix_timestamp() as usize,
            exp: (issued + TimeDuration::hours(6)).unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode_claims(&keys, &claims);
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn unauthorized_flag_is_rejected() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            authorized: false,
            user_id: 7,
            iat: now.unix_timestamp() as usize,
            exp: (now + TimeDuration::hours(1)).unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let err = keys.verify(&encode_claims(&keys, &claims)).unwrap_err();
        assert!(err.to_string().contains("not authorized"));
    }

    #[test]
    fn verify_rejects_wrong_secret_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let token = good.sign(3).expect("sign");
        assert!(make_keys("other-secret", "good-iss", "good-aud")
            .verify(&token)
            .is_err());
        assert!(make_keys("same-secret", "bad-iss", "bad-aud")
            .verify(&token)
            .is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("not.a.jwt").is_err());
    }
}
