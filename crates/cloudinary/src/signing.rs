//! Request signing for authenticated Cloudinary calls.

use sha1::{Digest, Sha1};

/// Signature for a `destroy` call.
///
/// Cloudinary signs the alphabetically sorted parameters joined as
/// `key=value&...` with the API secret appended, hashed with SHA-1.
pub fn sign_destroy(public_id: &str, timestamp: i64, api_secret: &str) -> String {
    let to_sign = format!("public_id={public_id}&timestamp={timestamp}{api_secret}");
    hex::encode(Sha1::digest(to_sign.as_bytes()))
}
