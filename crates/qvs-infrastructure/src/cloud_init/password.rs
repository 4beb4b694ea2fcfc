use rand::seq::SliceRandom;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Generates a password of `length` characters with exactly `digits` digits,
/// upper and lower case letters otherwise, and no repeated character.
///
/// VNC only honours the first 8 characters, so callers use `length <= 8` for
/// VNC passwords.
pub fn generate_password(length: usize, digits: usize) -> String {
    let digits = digits.min(length).min(DIGITS.len());
    let mut rng = rand::thread_rng();

    let mut chars: Vec<u8> = DIGITS
        .choose_multiple(&mut rng, digits)
        .copied()
        .chain(LETTERS.choose_multiple(&mut rng, length - digits).copied())
        .collect();
    chars.shuffle(&mut rng);

    // Avoid a leading digit; some VNC clients mangle it.
    if chars.first().is_some_and(u8::is_ascii_digit) {
        if let Some(pos) = chars.iter().position(|c| c.is_ascii_alphabetic()) {
            chars.swap(0, pos);
        }
    }

    String::from_utf8(chars).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_length_and_digit_count() {
        for _ in 0..50 {
            let pw = generate_password(8, 2);
            assert_eq!(pw.len(), 8);
            assert_eq!(pw.chars().filter(|c| c.is_ascii_digit()).count(), 2);
            assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_no_repeated_characters() {
        for _ in 0..50 {
            let pw = generate_password(8, 2);
            let unique: HashSet<char> = pw.chars().collect();
            assert_eq!(unique.len(), pw.len());
        }
    }

    #[test]
    fn test_first_character_is_a_letter() {
        for _ in 0..50 {
            let pw = generate_password(8, 2);
            assert!(pw.chars().next().unwrap().is_ascii_alphabetic());
        }
    }
}
