//! Builds the seed context for a `/expand` follow-up: a compressed view of
//! the prior session's report, insights, and sources.

use layer0::Session;

/// Prior report text longer than this is truncated with a trailing marker.
pub const MAX_REPORT_CHARS: usize = 2_000;
/// At most this many prior sources are carried into the continuation.
pub const MAX_SOURCES: usize = 10;

/// Truncate `text` to at most `max_chars` characters, appending an explicit
/// trailing marker when truncation occurred.
fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}... [truncated, {total} chars total]")
}

/// Build the deterministic continuation context for expanding `session`:
/// its (possibly truncated) report, every insight, and up to
/// [`MAX_SOURCES`] prior source URLs.
pub fn build_continuation_context(session: &Session) -> String {
    let mut out = String::new();
    out.push_str("Prior research:\n");
    out.push_str(&format!("Query: {}\n\n", session.query));

    if session.report.is_empty() {
        out.push_str("Prior report: (none)\n\n");
    } else {
        out.push_str("Prior report:\n");
        out.push_str(&truncate_with_marker(&session.report, MAX_REPORT_CHARS));
        out.push_str("\n\n");
    }

    if !session.insights.is_empty() {
        out.push_str("Prior insights:\n");
        for insight in &session.insights {
            out.push_str(&format!("- {}: {}\n", insight.title, insight.finding));
        }
        out.push('\n');
    }

    let sources = session.sources.take(MAX_SOURCES);
    if !sources.is_empty() {
        out.push_str("Prior sources:\n");
        for source in sources {
            out.push_str(&format!("- {source}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::{Mode, SessionId};

    fn session_with(report: &str, sources: &[&str]) -> Session {
        let mut session = Session::new(SessionId::new("s1"), "original query", Mode::Fast);
        session.report = report.to_string();
        for s in sources {
            session.sources.insert(*s);
        }
        session
    }

    #[test]
    fn short_report_is_not_truncated() {
        let session = session_with("a short report", &[]);
        let context = build_continuation_context(&session);
        assert!(context.contains("a short report"));
        assert!(!context.contains("truncated"));
    }

    #[test]
    fn long_report_is_truncated_with_marker() {
        let long = "x".repeat(MAX_REPORT_CHARS + 500);
        let session = session_with(&long, &[]);
        let context = build_continuation_context(&session);
        assert!(context.contains(&format!("truncated, {} chars total", MAX_REPORT_CHARS + 500)));
    }

    #[test]
    fn sources_are_capped_at_ten() {
        let urls: Vec<String> = (0..20).map(|i| format!("https://example.com/{i}")).collect();
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let session = session_with("report", &refs);
        let context = build_continuation_context(&session);
        for url in &urls[..10] {
            assert!(context.contains(url));
        }
        for url in &urls[10..] {
            assert!(!context.contains(url));
        }
    }

    #[test]
    fn is_deterministic() {
        let session = session_with("report", &["https://a", "https://b"]);
        assert_eq!(build_continuation_context(&session), build_continuation_context(&session));
    }
}
