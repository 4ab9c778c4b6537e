// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Access/refresh token issuance and the refresh gate (C1). The gate is an
//! explicit function called by the HTTP router and by the WS gate, not
//! framework middleware -- this lets it be unit tested without standing up
//! an actix App.

use crate::store::RefreshBlacklist;
use chrono::{Duration, Utc};
use common::error::{CoreError, CoreResult};
use common::id::{PlayerId, RefreshId};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: PlayerId,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: PlayerId,
    pub iat: i64,
    pub exp: i64,
    pub jti: RefreshId,
}

#[derive(Clone, Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub access_claims: AccessClaims,
    pub refresh_claims: RefreshClaims,
}

#[derive(Clone, Debug)]
pub struct TokenConfig {
    pub secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub refresh_threshold: Duration,
    pub access_cookie: String,
    pub refresh_cookie: String,
    pub cookie_secure: bool,
    pub cookie_same_site: &'static str,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: Vec::new(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            refresh_threshold: Duration::minutes(2),
            access_cookie: "access".to_owned(),
            refresh_cookie: "refresh".to_owned(),
            cookie_secure: true,
            cookie_same_site: "Lax",
        }
    }
}

pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(&config.secret);
        let decoding_key = DecodingKey::from_secret(&config.secret);
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issue(&self, subject: PlayerId, username: &str) -> CoreResult<TokenPair> {
        let now = Utc::now();
        let access_claims = AccessClaims {
            sub: subject,
            username: username.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.config.access_ttl).timestamp(),
        };
        let refresh_claims = RefreshClaims {
            sub: subject,
            iat: now.timestamp(),
            exp: (now + self.config.refresh_ttl).timestamp(),
            jti: RefreshId::new(),
        };
        self.encode_pair(access_claims, refresh_claims)
    }

    fn encode_pair(
        &self,
        access_claims: AccessClaims,
        refresh_claims: RefreshClaims,
    ) -> CoreResult<TokenPair> {
        let access = encode(&Header::default(), &access_claims, &self.encoding_key)
            .map_err(|e| CoreError::Internal(format!("encode access token: {}", e)))?;
        let refresh = encode(&Header::default(), &refresh_claims, &self.encoding_key)
            .map_err(|e| CoreError::Internal(format!("encode refresh token: {}", e)))?;
        Ok(TokenPair {
            access,
            refresh,
            access_claims,
            refresh_claims,
        })
    }

    pub fn decode_access(&self, token: &str) -> CoreResult<AccessClaims> {
        decode::<AccessClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(classify_jwt_error)
    }

    pub fn decode_refresh(&self, token: &str) -> CoreResult<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(classify_jwt_error)
    }

    /// Whether an already-valid access token is still outside the refresh
    /// window (i.e. may be used as-is without rotating).
    fn outside_refresh_window(&self, claims: &AccessClaims) -> bool {
        let expires_at = claims.exp;
        let threshold = Utc::now().timestamp() + self.config.refresh_threshold.num_seconds();
        expires_at > threshold
    }
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> CoreError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => CoreError::AuthExpired,
        _ => CoreError::AuthInvalid,
    }
}

/// Extracted from the upgrade/request cookies; transport-agnostic so both
/// the HTTP gate and the WS gate can build one from whatever cookie jar
/// their framework hands them.
#[derive(Default, Clone)]
pub struct CookieJar<'a> {
    pub access: Option<&'a str>,
    pub refresh: Option<&'a str>,
}

/// Outcome of the non-WS refresh gate (§4.6 steps 1-3).
pub enum GateOutcome {
    /// Access cookie was valid and comfortably unexpired; request proceeds
    /// unchanged.
    PassThrough(AccessClaims),
    /// Access cookie was missing or within the refresh window but a valid
    /// refresh cookie covered it; caller MUST set both new cookies on the
    /// response and retry identity extraction with `identity`.
    Rotated {
        identity: AccessClaims,
        new_tokens: TokenPair,
    },
    /// Neither cookie was usable; caller MUST clear both cookies (if
    /// present) and continue the request unauthenticated.
    Unauthenticated,
}

/// The explicit refresh gate invoked by the HTTP router on every request.
/// Deliberately not framework middleware (see design notes) so it can be
/// exercised directly in tests.
pub async fn refresh_gate<B, F, Fut>(
    tokens: &TokenService,
    blacklist: &B,
    username_of: F,
    jar: CookieJar<'_>,
) -> CoreResult<GateOutcome>
where
    B: RefreshBlacklist + ?Sized,
    F: FnOnce(PlayerId) -> Fut,
    Fut: std::future::Future<Output = Option<String>>,
{
    if let Some(access) = jar.access {
        if let Ok(claims) = tokens.decode_access(access) {
            if tokens.outside_refresh_window(&claims) {
                return Ok(GateOutcome::PassThrough(claims));
            }
        }
    }

    if let Some(refresh) = jar.refresh {
        if let Ok(old_claims) = tokens.decode_refresh(refresh) {
            if blacklist.is_blacklisted(old_claims.jti).await? {
                // A refresh token is single-use; seeing its jti again means
                // it was already rotated (or revoked) and this is a replay,
                // not an ordinary "nothing to authenticate with" case.
                return Err(CoreError::AuthInvalid);
            }
            blacklist.blacklist(old_claims.jti).await?;
            let username = username_of(old_claims.sub)
                .await
                .ok_or(CoreError::NotFound("player for refresh subject"))?;
            let new_tokens = tokens.issue(old_claims.sub, &username)?;
            return Ok(GateOutcome::Rotated {
                identity: new_tokens.access_claims.clone(),
                new_tokens,
            });
        }
    }

    Ok(GateOutcome::Unauthenticated)
}

/// WS upgrade authentication (§4.8): same cookie extraction, no rotation.
/// A missing or invalid access cookie is an error the caller closes the
/// socket for.
pub fn ws_authenticate(tokens: &TokenService, access_cookie: Option<&str>) -> CoreResult<AccessClaims> {
    let token = access_cookie.ok_or(CoreError::AuthMissing)?;
    tokens.decode_access(token)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::RefreshBlacklist;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn service() -> TokenService {
        TokenService::new(TokenConfig {
            secret: b"test-secret".to_vec(),
            ..Default::default()
        })
    }

    #[derive(Default)]
    struct MemBlacklist(Mutex<HashSet<RefreshId>>);

    #[async_trait]
    impl RefreshBlacklist for MemBlacklist {
        async fn is_blacklisted(&self, jti: RefreshId) -> CoreResult<bool> {
            Ok(self.0.lock().unwrap().contains(&jti))
        }
        async fn blacklist(&self, jti: RefreshId) -> CoreResult<()> {
            self.0.lock().unwrap().insert(jti);
            Ok(())
        }
    }

    #[test]
    fn issue_then_decode_round_trips() {
        let svc = service();
        let pair = svc.issue(PlayerId::new(), "alice").unwrap();
        let claims = svc.decode_access(&pair.access).unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn expired_access_token_is_classified_as_expired() {
        let svc = TokenService::new(TokenConfig {
            secret: b"test-secret".to_vec(),
            access_ttl: Duration::seconds(-1),
            ..Default::default()
        });
        let pair = svc.issue(PlayerId::new(), "bob").unwrap();
        let err = svc.decode_access(&pair.access).unwrap_err();
        assert!(matches!(err, CoreError::AuthExpired));
    }

    #[tokio::test]
    async fn refresh_rotation_blacklists_old_jti() {
        let svc = service();
        let blacklist = MemBlacklist::default();
        let player = PlayerId::new();
        let pair = svc.issue(player, "carol").unwrap();
        let old_jti = pair.refresh_claims.jti;

        let jar = CookieJar {
            access: None,
            refresh: Some(&pair.refresh),
        };
        let outcome = refresh_gate(&svc, &blacklist, |_| async { Some("carol".to_owned()) }, jar)
            .await
            .unwrap();
        match outcome {
            GateOutcome::Rotated { new_tokens, .. } => {
                assert_ne!(new_tokens.refresh_claims.jti, old_jti);
            }
            _ => panic!("expected rotation"),
        }
        assert!(blacklist.is_blacklisted(old_jti).await.unwrap());

        // Reusing the old (now blacklisted) refresh token is a replay: the
        // gate rejects it outright rather than falling back to anonymous.
        let jar2 = CookieJar {
            access: None,
            refresh: Some(&pair.refresh),
        };
        let err = refresh_gate(&svc, &blacklist, |_| async { Some("carol".to_owned()) }, jar2)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AuthInvalid));
    }

    #[test]
    fn ws_authenticate_requires_access_cookie() {
        let svc = service();
        let err = ws_authenticate(&svc, None).unwrap_err();
        assert!(matches!(err, CoreError::AuthMissing));
    }
}
