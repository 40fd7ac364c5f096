//! Timed lyric parser
//!
//! Each usable line starts with a `[mm:ss.cc]` stamp:
//! [00:12.50] Hello
//! [00:15.00] World
//!
//! Anything else (metadata tags, section labels, blank lines) is skipped.

/// A single lyric line with its start time.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Seconds from the start of the track, hundredths precision
    pub time_seconds: f64,
    pub text: String,
}

impl LyricLine {
    pub fn new(time_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            time_seconds,
            text: text.into(),
        }
    }
}

/// Parse timed lyrics, keeping lines in input order.
pub fn parse(raw: &str) -> Vec<LyricLine> {
    raw.lines().filter_map(parse_timed_line).collect()
}

/// Parse a line like `[00:12.50]Hello`.
fn parse_timed_line(line: &str) -> Option<LyricLine> {
    let line = line.trim_start();
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    let time_seconds = parse_timestamp(&rest[..end])?;
    let text = rest[end + 1..].trim();
    Some(LyricLine::new(time_seconds, text))
}

/// Parse `mm:ss.cc` into seconds.
fn parse_timestamp(s: &str) -> Option<f64> {
    let (min, rest) = s.split_once(':')?;
    let (sec, centis) = rest.split_once('.')?;
    if min.len() != 2 || sec.len() != 2 || centis.len() != 2 {
        return None;
    }
    if !(min.bytes().chain(sec.bytes()).chain(centis.bytes())).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let min: u64 = min.parse().ok()?;
    let sec: u64 = sec.parse().ok()?;
    let centis: u64 = centis.parse().ok()?;
    Some((min * 6000 + sec * 100 + centis) as f64 / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:12.50"), Some(12.5));
        assert_eq!(parse_timestamp("01:30.00"), Some(90.0));
        assert_eq!(parse_timestamp("10:00.07"), Some(600.07));
        assert_eq!(parse_timestamp("00:12"), None);
        assert_eq!(parse_timestamp("0:12.50"), None);
        assert_eq!(parse_timestamp("00:12.5"), None);
        assert_eq!(parse_timestamp("ti:Title"), None);
        assert_eq!(parse_timestamp("+0:12.50"), None);
    }

    #[test]
    fn test_parse_lyrics() {
        let raw = "[00:12.50]Hello\n[00:15.00]World";
        let lines = parse(raw);
        assert_eq!(
            lines,
            vec![LyricLine::new(12.5, "Hello"), LyricLine::new(15.0, "World")]
        );
    }

    #[test]
    fn test_unstamped_lines_are_dropped_without_shifting() {
        let raw = r#"
[ti:Test Song]
[00:01.00]  First line
(instrumental)
[Chorus]
[00:04.25]Second line
"#;
        let lines = parse(raw);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "First line");
        assert_eq!(lines[1].time_seconds, 4.25);
        assert_eq!(lines[1].text, "Second line");
    }

    #[test]
    fn test_input_order_is_kept() {
        let lines = parse("[00:20.00]b\n[00:10.00]a");
        assert_eq!(lines[0].text, "b");
        assert_eq!(lines[1].text, "a");
    }

    #[test]
    fn test_ordered_input_yields_non_decreasing_times() {
        let raw = "[00:00.00]\n[00:01.10]x\n[00:01.10]y\nnoise\n[02:00.99]z";
        let lines = parse(raw);
        assert!(lines.windows(2).all(|w| w[0].time_seconds <= w[1].time_seconds));
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].text, "");
    }

    #[test]
    fn test_crlf_input() {
        let lines = parse("[00:01.00]one\r\n[00:02.00]two\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "one");
    }
}
