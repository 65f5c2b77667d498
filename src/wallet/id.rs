//! Identifier generation for folders and wallets

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random suffix length
const RANDOM_CHARS: usize = 8;

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Generate a unique id: `<prefix>_<base36 millis><8 random base36 chars>`
pub fn generate_uid(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_CHARS)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    if prefix.is_empty() {
        format!("{}{}", to_base36(millis), random)
    } else {
        format!("{}_{}{}", prefix, to_base36(millis), random)
    }
}

/// Shorten an id for display: first and last `size` chars around "..."
pub fn to_short_uid(id: &str, size: usize) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= size * 2 {
        return id.to_string();
    }
    let head: String = chars[..size].iter().collect();
    let tail: String = chars[chars.len() - size..].iter().collect();
    format!("{}...{}", head, tail)
}
