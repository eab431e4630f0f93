//! Provider payment signatures: hex HMAC-SHA256 over `order_id|payment_id`

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

/// Hex signature the provider would issue for this payment
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
    mac(secret, order_id, payment_id)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Check a hex signature in constant time. Malformed hex never verifies.
pub fn verify(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    mac(secret, order_id, payment_id).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}
