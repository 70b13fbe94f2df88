use std::borrow::Cow;

pub fn ellipsize(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }

    let keep = max_chars.saturating_sub(3);
    let cut = text.chars().take(keep).collect::<String>();
    Cow::Owned(format!("{}...", cut.trim_end()))
}

pub fn format_seconds(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsize_keeps_short_text_borrowed() {
        let text = "short sentence";
        assert!(matches!(ellipsize(text, 20), Cow::Borrowed(_)));
        assert_eq!(ellipsize(text, 20), text);
    }

    #[test]
    fn ellipsize_truncates_on_char_boundary() {
        let truncated = ellipsize("日本語のテキストです", 8);
        assert_eq!(truncated.as_ref(), "日本語のテ...");
    }

    #[test]
    fn ellipsize_trims_trailing_space_before_dots() {
        assert_eq!(ellipsize("one two three four", 11).as_ref(), "one two...");
    }

    #[test]
    fn format_seconds_pads_to_two_digits() {
        assert_eq!(format_seconds(0), "0:00");
        assert_eq!(format_seconds(65), "1:05");
        assert_eq!(format_seconds(754), "12:34");
    }
}
