//! Human-readable order codes

use rand::Rng;

pub const ORDER_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ORDER_CODE_LEN: usize = 6;

/// Six characters drawn uniformly from `[A-Z0-9]`
pub fn generate_order_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ORDER_CODE_LEN)
        .map(|_| ORDER_CODE_ALPHABET[rng.gen_range(0..ORDER_CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_order_code(code: &str) -> bool {
    code.len() == ORDER_CODE_LEN && code.bytes().all(|b| ORDER_CODE_ALPHABET.contains(&b))
}
