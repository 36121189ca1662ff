//! WebVTT parsing.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::{CaptionError, Cue};

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern should compile"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

/// Parse a WebVTT document into cues.
///
/// Inline markup (`<c>`, `<i>`, karaoke timestamps) is removed and the common
/// entities are decoded. Cues with no remaining text are dropped, and a cue
/// repeating the previous cue's text is merged into it.
pub fn parse_vtt(input: &str) -> Result<Vec<Cue>, CaptionError> {
    let input = input.trim_start_matches('\u{feff}');
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");
    let mut blocks = normalized.split("\n\n").map(|b| b.trim_matches('\n'));

    let header = blocks.next().unwrap_or_default();
    if !header.starts_with("WEBVTT") {
        return Err(CaptionError::Parse("missing WEBVTT header".to_string()));
    }

    let mut cues: Vec<Cue> = Vec::new();
    for block in blocks {
        if block.is_empty()
            || block.starts_with("NOTE")
            || block.starts_with("STYLE")
            || block.starts_with("REGION")
        {
            continue;
        }

        let mut lines = block.lines();
        let Some(mut timing_line) = lines.next() else {
            continue;
        };
        if !timing_line.contains("-->") {
            // Optional cue identifier.
            match lines.next() {
                Some(next) => timing_line = next,
                None => continue,
            }
        }

        let (start, end) = parse_timing_line(timing_line)?;
        let payload: Vec<&str> = lines.collect();
        let text = clean_payload(&payload.join(" "));
        if text.is_empty() {
            continue;
        }

        match cues.last_mut() {
            Some(prev) if prev.text == text => prev.end = prev.end.max(end),
            _ => cues.push(Cue { start, end, text }),
        }
    }

    Ok(cues)
}

fn parse_timing_line(line: &str) -> Result<(Duration, Duration), CaptionError> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| CaptionError::Parse(format!("bad cue timing: {}", line)))?;
    let end = rest.split_whitespace().next().unwrap_or_default();
    Ok((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// Parse `[hh:]mm:ss.mmm`.
pub fn parse_timestamp(value: &str) -> Result<Duration, CaptionError> {
    let bad = || CaptionError::Parse(format!("bad timestamp: '{}'", value));

    let (clock, millis) = value.split_once('.').ok_or_else(bad)?;
    let millis: u64 = millis.parse().map_err(|_| bad())?;
    if millis > 999 {
        return Err(bad());
    }

    let parts: Vec<u64> = clock
        .split(':')
        .map(|p| p.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad())?;
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(bad()),
    };
    if minutes > 59 || seconds > 59 {
        return Err(bad());
    }

    let total_millis = hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1000 + millis))
        .ok_or_else(bad)?;
    Ok(Duration::from_millis(total_millis))
}

fn clean_payload(payload: &str) -> String {
    let stripped = TAG.replace_all(payload, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_track() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                   00:00:00.000 --> 00:00:02.500 align:start position:0%\n\
                   we meet Bob today\n\n\
                   2\n\
                   00:00:02.500 --> 00:00:04.000\n\
                   see you\nsoon\n";
        let cues = parse_vtt(vtt).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "we meet Bob today");
        assert_eq!(cues[0].end, Duration::from_millis(2_500));
        assert_eq!(cues[1].text, "see you soon");
        assert_eq!(cues[1].start, Duration::from_millis(2_500));
    }

    #[test]
    fn test_markup_and_entities_removed() {
        let vtt = "\u{feff}WEBVTT\r\n\r\n\
                   00:01.000 --> 00:02.000\r\n\
                   <c.colorE5E5E5>Tom &amp; Jerry</c><00:00:01.500><c> &gt;&gt; run</c>\r\n";
        let cues = parse_vtt(vtt).unwrap();

        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Tom & Jerry >> run");
        assert_eq!(cues[0].start, Duration::from_secs(1));
    }

    #[test]
    fn test_notes_styles_and_empty_cues_skipped() {
        let vtt = "WEBVTT\n\nNOTE generated by a tool\n\nSTYLE\n::cue { color: white }\n\n\
                   00:00:01.000 --> 00:00:02.000\n<i></i>\n\n\
                   00:00:02.000 --> 00:00:03.000\nhello\n";
        let cues = parse_vtt(vtt).unwrap();

        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "hello");
    }

    #[test]
    fn test_repeated_cues_merged() {
        let vtt = "WEBVTT\n\n\
                   00:00:01.000 --> 00:00:02.000\nhello there\n\n\
                   00:00:02.000 --> 00:00:03.000\nhello there\n\n\
                   00:00:03.000 --> 00:00:04.000\ngeneral Kenobi\n";
        let cues = parse_vtt(vtt).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].end, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(matches!(
            parse_vtt("00:00:01.000 --> 00:00:02.000\nhi\n"),
            Err(CaptionError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_timestamps_rejected() {
        assert!(parse_timestamp("00:61.000").is_err());
        assert!(parse_timestamp("00:01").is_err());
        assert!(parse_timestamp("aa:01.000").is_err());
        assert_eq!(
            parse_timestamp("01:02:03.004").unwrap(),
            Duration::from_millis(3_723_004)
        );
    }

    #[test]
    fn test_overflowing_hours_rejected() {
        assert!(matches!(
            parse_timestamp("99999999999999999:00:00.000"),
            Err(CaptionError::Parse(_))
        ));
        assert!(parse_timestamp("5124095576030:00:00.000").is_ok());
        assert!(parse_timestamp("5124095576031:00:00.000").is_err());

        let vtt = "WEBVTT\n\n99999999999999999:00:00.000 --> 99999999999999999:00:01.000\nhi\n";
        assert!(matches!(parse_vtt(vtt), Err(CaptionError::Parse(_))));
    }

    #[test]
    fn test_header_only_track_has_no_cues() {
        assert!(parse_vtt("WEBVTT\n\n").unwrap().is_empty());
    }
}
