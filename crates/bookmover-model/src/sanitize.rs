/// Enforces I4: strips NUL and any other control byte except tab, newline,
/// and carriage return from a string before it is ever persisted.
///
/// This is applied at the boundary where strings enter the system (metadata
/// extraction, catalog records) rather than re-checked at every call site
/// that reads them back out.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|&c| !c.is_control() || c == '\t' || c == '\n' || c == '\r')
        .collect()
}

/// Truncates to at most `max_chars` Unicode scalar values, sanitizing first
/// so the truncation boundary never lands inside a byte that should have
/// been stripped.
pub fn sanitize_and_truncate(input: &str, max_chars: usize) -> String {
    sanitize(input).chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_nul_bytes() {
        let s = sanitize("ti\u{0}tle");
        assert!(!s.contains('\u{0}'));
        assert_eq!(s, "title");
    }

    #[test]
    fn keeps_tab_newline_and_carriage_return() {
        let s = sanitize("a\tb\nc\rd");
        assert_eq!(s, "a\tb\nc\rd");
    }

    #[test]
    fn strips_other_control_bytes() {
        let s = sanitize("a\u{1}b\u{7}c");
        assert_eq!(s, "abc");
    }

    #[test]
    fn truncate_caps_character_count_after_sanitizing() {
        let s = sanitize_and_truncate("abc\u{0}def", 4);
        assert_eq!(s, "abcd");
    }
}
