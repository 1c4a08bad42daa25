//! SSML rendering for engines that accept prosody markup

use std::fmt::Write;

use crate::profile::{Emphasis, VoiceParameters};

/// Wrap `text` in `<prosody>` (and `<emphasis>` when set).
///
/// `baseline_rate` is the words-per-minute value that corresponds to 100%.
pub fn render(text: &str, params: &VoiceParameters, baseline_rate: u32) -> String {
    let rate_pct = params.rate as f32 / baseline_rate.max(1) as f32 * 100.0;
    let body = escape(text);

    let mut out = String::from("<speak>");
    let _ = write!(
        out,
        "<prosody rate=\"{:.0}%\" pitch=\"{:+.1}st\" volume=\"{:.0}\">",
        rate_pct,
        params.pitch,
        params.volume * 100.0
    );
    match params.emphasis {
        Emphasis::None => out.push_str(&body),
        level => {
            let _ = write!(out, "<emphasis level=\"{}\">{}</emphasis>", level, body);
        }
    }
    out.push_str("</prosody></speak>");
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
