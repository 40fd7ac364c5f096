pub mod detail;
pub mod help;
pub mod now_playing;
pub mod root;
pub mod song_list;
pub mod toolbar;

/// Cut `s` to `max_len` characters, marking the cut with "...".
pub(crate) fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    let char_count: usize = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        s.chars().take(max_len).collect()
    }
}

/// `s` truncated and right-padded to exactly `width` characters.
pub(crate) fn fit(s: &str, width: usize) -> String {
    let t = truncate_str(s, width);
    let pad = width.saturating_sub(t.chars().count());
    format!("{t}{}", " ".repeat(pad))
}

pub(crate) fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
