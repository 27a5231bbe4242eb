//! Nickname validation.

/// Maximum nickname length per RFC 1459 §1.2.
pub const NICK_MAX_LEN: usize = 9;

/// Returns true if the character is one of the RFC "special" nick characters.
fn is_special(c: char) -> bool {
    matches!(c, '[' | ']' | '\\' | '`' | '^' | '{' | '}' | '|' | '_')
}

/// Validate an IRC nickname: 1..=9 characters, starting with a letter or
/// special, continuing with letters, digits, specials, or `-`.
pub fn is_valid_nick(nick: &str) -> bool {
    if nick.is_empty() || nick.len() > NICK_MAX_LEN {
        return false;
    }
    let mut chars = nick.chars();
    let first = chars.next().expect("non-empty");
    if !first.is_ascii_alphabetic() && !is_special(first) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || is_special(c) || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_nicks() {
        assert!(is_valid_nick("alice"));
        assert!(is_valid_nick("WiZ"));
        assert!(is_valid_nick("n1ck-[x]"));
        assert!(is_valid_nick("_under"));
    }

    #[test]
    fn rejects_overlong_nicks() {
        assert!(is_valid_nick("ninechars"));
        assert!(!is_valid_nick("tencharsxx"));
    }

    #[test]
    fn rejects_bad_leading_characters() {
        assert!(!is_valid_nick(""));
        assert!(!is_valid_nick("1abc"));
        assert!(!is_valid_nick("-abc"));
        assert!(!is_valid_nick("#chan"));
    }

    #[test]
    fn rejects_embedded_separators() {
        assert!(!is_valid_nick("a b"));
        assert!(!is_valid_nick("a,b"));
        assert!(!is_valid_nick("a!b"));
    }
}
