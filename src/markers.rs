//! Success-marker heuristic shared by the readable strategies and the prober.
//!
//! The endpoint gives no machine-readable acknowledgement, so confirmation is
//! inferred from thank-you style phrases in the returned HTML. This produces
//! both false negatives (localized or restyled pages) and false positives
//! (phrases that appear on unrelated pages).

/// Phrases treated as confirmation, checked in this order.
pub const SUCCESS_MARKERS: [&str; 5] = [
    "thank you",
    "submitted successfully",
    "response recorded",
    "your response has been recorded",
    "form submitted",
];

/// Returns the first success marker contained in `text`, ignoring case.
pub fn find_success_marker(text: &str) -> Option<&'static str> {
    if text.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    SUCCESS_MARKERS
        .iter()
        .copied()
        .find(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_thank_you_page() {
        let html = "<html><body><div>Thank you for your response</div></body></html>";
        assert_eq!(find_success_marker(html), Some("thank you"));
    }

    #[test]
    fn matches_recorded_notice_case_insensitively() {
        assert_eq!(
            find_success_marker("YOUR RESPONSE HAS BEEN RECORDED."),
            Some("your response has been recorded")
        );
    }

    #[test]
    fn empty_and_markerless_text_never_match() {
        assert_eq!(find_success_marker(""), None);
        assert_eq!(find_success_marker("<html><title>Sign in</title></html>"), None);
        assert_eq!(find_success_marker("thank-you"), None);
    }

    #[test]
    fn repeated_checks_agree() {
        let text = "Form submitted. Have a nice day.";
        let first = find_success_marker(text);
        let second = find_success_marker(text);
        assert_eq!(first, second);
        assert_eq!(first, Some("form submitted"));
    }
}
