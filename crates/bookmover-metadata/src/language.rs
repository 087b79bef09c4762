//! Normalizes legacy three-letter language codes to their ISO-639-1
//! two-letter equivalent (§4.2). Unknown codes pass through lowercased
//! rather than being rejected — extraction must never fail the pipeline
//! over a metadata quirk.

const THREE_TO_TWO: &[(&str, &str)] = &[
    ("eng", "en"),
    ("fre", "fr"),
    ("fra", "fr"),
    ("ger", "de"),
    ("deu", "de"),
    ("spa", "es"),
    ("ita", "it"),
    ("por", "pt"),
    ("rus", "ru"),
    ("jpn", "ja"),
    ("chi", "zh"),
    ("zho", "zh"),
    ("dut", "nl"),
    ("nld", "nl"),
    ("swe", "sv"),
    ("pol", "pl"),
    ("kor", "ko"),
    ("ara", "ar"),
];

pub fn normalize(code: &str) -> String {
    let lower = code.trim().to_ascii_lowercase();
    if lower.len() == 2 {
        return lower;
    }
    THREE_TO_TWO
        .iter()
        .find(|(three, _)| *three == lower)
        .map(|(_, two)| two.to_string())
        .unwrap_or(lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_letter_codes_pass_through() {
        assert_eq!(normalize("en"), "en");
        assert_eq!(normalize("EN"), "en");
    }

    #[test]
    fn known_three_letter_codes_shrink_to_two() {
        assert_eq!(normalize("eng"), "en");
        assert_eq!(normalize("fra"), "fr");
        assert_eq!(normalize("deu"), "de");
    }

    #[test]
    fn both_bibliographic_and_terminology_variants_normalize() {
        assert_eq!(normalize("fre"), "fr");
        assert_eq!(normalize("fra"), "fr");
        assert_eq!(normalize("chi"), "zh");
        assert_eq!(normalize("zho"), "zh");
    }

    #[test]
    fn unknown_codes_pass_through_lowercased() {
        assert_eq!(normalize("xyz"), "xyz");
    }
}
