use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_PREFIX: &str = "sha1=";

/// Check a `X-Hub-Signature` value against the raw body.
///
/// An empty secret disables verification. Otherwise the header is split on
/// whitespace and every `sha1=`-prefixed token is compared against the hex
/// HMAC-SHA1 of the body; one match is enough. A missing header (`None`)
/// never verifies.
pub fn verify(secret: &str, body: &[u8], header: Option<&str>) -> bool {
    if secret.is_empty() {
        return true;
    }

    let Some(header) = header else {
        return false;
    };

    let Ok(expected) = sign(secret, body) else {
        return false;
    };

    // lowercase hex only; byte-wise so uppercase digests never match
    header
        .split_whitespace()
        .filter_map(|token| token.strip_prefix(SIGNATURE_PREFIX))
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())))
}

/// Lowercase hex HMAC-SHA1 of `body` keyed by `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
