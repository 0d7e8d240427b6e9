//! Signed session cookie values: `{session_id}.{hex HMAC-SHA256}`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn sign_session_id(session_id: &str, secret: &str) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(session_id.as_bytes());
    format!("{}.{}", session_id, hex::encode(mac.finalize().into_bytes()))
}

/// Returns the session id when the signature matches, `None` otherwise.
pub fn verify_signed_cookie(cookie_value: &str, secret: &str) -> Option<String> {
    let (session_id, signature_hex) = cookie_value.rsplit_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = keyed_mac(secret);
    mac.update(session_id.as_bytes());
    match mac.verify_slice(&signature) {
        Ok(()) => Some(session_id.to_owned()),
        Err(_) => {
            tracing::warn!(
                "Rejected tampered session cookie starting with {}",
                cookie_value.chars().take(8).collect::<String>()
            );
            None
        }
    }
}

fn keyed_mac(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length.
    #[allow(clippy::expect_used)]
    let mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac
}
