use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use howl_core::ids::{PlayerId, RoomId};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies reconnect session tokens. A token binds (room, player)
/// under an HMAC-SHA256 tag: `"<room>.<player>.<hex tag>"`. Presenting a
/// valid token is the only way to reclaim a previously issued identity —
/// a bare player id is never proof of anything.
#[derive(Clone)]
pub struct SessionKeys {
    secret: Vec<u8>,
}

impl SessionKeys {
    /// Build from the configured secret, or a random per-process key when
    /// none is set.
    pub fn new(configured: Option<&str>) -> Self {
        let secret = match configured {
            Some(s) if !s.is_empty() => s.as_bytes().to_vec(),
            _ => {
                let mut buf = vec![0u8; 32];
                rand::rng().fill_bytes(&mut buf);
                buf
            },
        };
        Self { secret }
    }

    // HMAC-SHA256 accepts any key length, so construction cannot fail for a
    // non-empty secret; the fallback keeps the signature infallible anyway.
    fn tag(&self, room: RoomId, player: PlayerId) -> Vec<u8> {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return Vec::new();
        };
        mac.update(room.to_string().as_bytes());
        mac.update(b".");
        mac.update(player.to_string().as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Issue a resume token for a (room, player) pair. Deterministic, so
    /// re-issuing on reconnect hands back the same credential.
    pub fn issue(&self, room: RoomId, player: PlayerId) -> String {
        format!("{room}.{player}.{}", hex::encode(self.tag(room, player)))
    }

    /// Verify a presented token. Returns the bound identity, or `None` for
    /// anything malformed or forged — callers surface only a generic failure
    /// to avoid identity probing.
    pub fn verify(&self, token: &str) -> Option<(RoomId, PlayerId)> {
        let mut parts = token.splitn(3, '.');
        let room = RoomId::parse(parts.next()?)?;
        let player = PlayerId::parse(parts.next()?)?;
        let presented = hex::decode(parts.next()?).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(room.to_string().as_bytes());
        mac.update(b".");
        mac.update(player.to_string().as_bytes());
        mac.verify_slice(&presented).ok()?;
        Some((room, player))
    }
}

/// Bearer-token configuration for the status API.
#[derive(Clone, Default)]
pub struct ApiAuth {
    pub bearer_token: Option<String>,
}

/// Axum middleware validating Bearer token authentication. With no token
/// configured, all requests pass.
pub async fn bearer_auth_middleware(
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth = request
        .extensions()
        .get::<ApiAuth>()
        .cloned()
        .unwrap_or_default();

    if let Some(ref expected) = auth.bearer_token {
        let provided = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match provided {
            Some(token) if token == expected => {},
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_verify_roundtrip() {
        let keys = SessionKeys::new(Some("test-secret"));
        let room = RoomId::new();
        let player = PlayerId::new();
        let token = keys.issue(room, player);
        assert_eq!(keys.verify(&token), Some((room, player)));
    }

    #[test]
    fn issue_is_deterministic() {
        let keys = SessionKeys::new(Some("test-secret"));
        let room = RoomId::new();
        let player = PlayerId::new();
        assert_eq!(keys.issue(room, player), keys.issue(room, player));
    }

    #[test]
    fn forged_tag_rejected() {
        let keys = SessionKeys::new(Some("test-secret"));
        let room = RoomId::new();
        let player = PlayerId::new();
        let forged = format!("{room}.{player}.{}", hex::encode([0u8; 32]));
        assert_eq!(keys.verify(&forged), None);
    }

    #[test]
    fn token_from_other_key_rejected() {
        let keys_a = SessionKeys::new(Some("secret-a"));
        let keys_b = SessionKeys::new(Some("secret-b"));
        let token = keys_a.issue(RoomId::new(), PlayerId::new());
        assert_eq!(keys_b.verify(&token), None);
    }

    #[test]
    fn swapped_identity_rejected() {
        // A token for player X must not authenticate player Y.
        let keys = SessionKeys::new(Some("test-secret"));
        let room = RoomId::new();
        let token = keys.issue(room, PlayerId::new());
        let tag = token.rsplit('.').next().unwrap().to_string();
        let forged = format!("{room}.{}.{tag}", PlayerId::new());
        assert_eq!(keys.verify(&forged), None);
    }

    #[test]
    fn malformed_tokens_rejected() {
        let keys = SessionKeys::new(Some("test-secret"));
        for junk in ["", "a.b", "a.b.c", "x.y.zzzz", "...."] {
            assert_eq!(keys.verify(junk), None, "token {junk:?}");
        }
    }

    #[test]
    fn random_key_still_roundtrips() {
        let keys = SessionKeys::new(None);
        let room = RoomId::new();
        let player = PlayerId::new();
        let token = keys.issue(room, player);
        assert_eq!(keys.verify(&token), Some((room, player)));
    }
}
