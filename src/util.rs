//! Small shared utilities.

/// Check if a `nick!user@host` mask matches a ban pattern.
/// Supports `*` and `?` wildcards, case-insensitively.
pub fn matches_hostmask(pattern: &str, hostmask: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let hostmask = hostmask.to_lowercase();
    matches_inner(&pattern, &hostmask)
}

fn matches_inner(pattern: &str, subject: &str) -> bool {
    let mut p_chars = pattern.chars().peekable();
    let mut s_chars = subject.chars().peekable();

    while let Some(p) = p_chars.next() {
        match p {
            '*' => {
                while p_chars.peek() == Some(&'*') {
                    p_chars.next();
                }
                if p_chars.peek().is_none() {
                    return true;
                }
                let remaining_pattern: String = p_chars.collect();
                loop {
                    let remaining_subject: String = s_chars.clone().collect();
                    if matches_inner(&remaining_pattern, &remaining_subject) {
                        return true;
                    }
                    if s_chars.next().is_none() {
                        return false;
                    }
                }
            }
            '?' => {
                if s_chars.next().is_none() {
                    return false;
                }
            }
            c => {
                if s_chars.next() != Some(c) {
                    return false;
                }
            }
        }
    }

    s_chars.peek().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_masks_match_exactly() {
        assert!(matches_hostmask("nick!user@host", "nick!user@host"));
        assert!(!matches_hostmask("nick!user@host", "nick!user@other"));
    }

    #[test]
    fn star_matches_any_run() {
        assert!(matches_hostmask("*!*@*", "nick!user@host"));
        assert!(matches_hostmask("*!*@*.example.com", "nick!user@a.example.com"));
        assert!(!matches_hostmask("*!user@*", "nick!other@host"));
        assert!(matches_hostmask("bad*", "badnick!u@h"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        assert!(matches_hostmask("n?ck!*@*", "nick!user@host"));
        assert!(!matches_hostmask("n?ck!*@*", "nck!user@host"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(matches_hostmask("NICK!*@*", "nick!User@HOST"));
    }
}
