//! SubRip (`.srt`) caption import and export.
//!
//! A document is a sequence of blocks separated by blank lines:
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:03,500
//! First caption line
//! optional second line
//! ```
//!
//! Import accepts `\n`, `\r\n` and bare `\r` line endings and tolerates a
//! missing index line or a `.` as the fraction separator. A block whose timing
//! line cannot be read rejects the whole document. Export always renumbers
//! from 1 and writes `HH:MM:SS,mmm` timestamps.

use crate::annotations::SubtitleSegment;
use thiserror::Error;

const ARROW: &str = "-->";

#[derive(Debug, Error, PartialEq)]
pub enum SubtitleError {
    #[error("block {block}: missing timing line")]
    MissingTiming { block: usize },
    #[error("block {block}: invalid timestamp '{value}'")]
    InvalidTimestamp { block: usize, value: String },
}

/// Parse an SRT document into segments, in document order.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleSegment>, SubtitleError> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut segments = Vec::new();

    for (i, block) in split_blocks(&normalized).into_iter().enumerate() {
        let block_number = i + 1;
        let mut lines = block.iter().copied();

        let first = lines.next().unwrap_or_default();
        let timing = if first.contains(ARROW) {
            first
        } else {
            lines
                .next()
                .filter(|line| line.contains(ARROW))
                .ok_or(SubtitleError::MissingTiming {
                    block: block_number,
                })?
        };

        let (start, end) = parse_timing(timing, block_number)?;
        let text = lines.collect::<Vec<_>>().join("\n");
        segments.push(SubtitleSegment::new(start, end, text));
    }

    Ok(segments)
}

/// Render segments as an SRT document, numbering blocks from 1.
pub fn to_srt(segments: &[SubtitleSegment]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            format!(
                "{}\n{} {ARROW} {}\n{}\n",
                i + 1,
                format_timestamp(seg.start),
                format_timestamp(seg.end),
                seg.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Groups of non-blank lines. A block of only an index and a timing line is
// kept so captions with empty text survive a round trip.
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_timing(line: &str, block: usize) -> Result<(f64, f64), SubtitleError> {
    let (start, end) = line
        .split_once(ARROW)
        .ok_or(SubtitleError::MissingTiming { block })?;
    // Some writers append positioning hints after the end time
    let end = end.split_whitespace().next().unwrap_or_default();
    Ok((parse_timestamp(start.trim(), block)?, parse_timestamp(end, block)?))
}

/// Parse `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`) into seconds.
pub fn parse_timestamp(value: &str, block: usize) -> Result<f64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp {
        block,
        value: value.to_string(),
    };

    let parts: Vec<&str> = value.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(invalid());
    };

    let hours: u64 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
        .ok_or_else(invalid)?;
    Ok(whole as f64 + seconds)
}

/// Format seconds as `HH:MM:SS,mmm`, rounding to the nearest millisecond.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
