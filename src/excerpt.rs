//! Excerpt extraction: heading-delimited sections for Markdown, merged
//! fixed-radius line windows for everything else.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::extension_of;
use crate::patterns::ReferencePatternSet;
use crate::types::Section;

/// ATX heading: up to three leading spaces, one to six `#`, non-empty text.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static HEADING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^\s{0,3}#{1,6}\s+(.*\S)\s*$").expect("valid regex"));

/// Label used for a qualifying window with no usable heading text.
const UNTITLED_SECTION: &str = "Untitled section";

/// Extract up to `max_sections` excerpts from one documentation file.
///
/// Markdown files try heading sections first; if none qualifies, or the file
/// is not Markdown, line windows of `context_lines` around each hit are used.
pub fn extract_sections(
    path: &Path,
    text: &str,
    patterns: &ReferencePatternSet,
    max_sections: usize,
    context_lines: usize,
) -> Vec<Section> {
    let lines = split_lines(text);

    if is_heading_structured(path) {
        let sections = extract_heading_sections(&lines, patterns, max_sections);
        if !sections.is_empty() {
            return sections;
        }
    }

    return extract_windows(&lines, patterns, context_lines, max_sections);
}

/// Split on heading lines and keep the windows whose text matches.
///
/// Each window runs from its heading to the line before the next heading.
/// Text above the first heading forms its own untitled window. Files with no
/// headings yield nothing here.
pub fn extract_heading_sections(
    lines: &[&str],
    patterns: &ReferencePatternSet,
    max_sections: usize,
) -> Vec<Section> {
    let heading_indices: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| return HEADING_PATTERN.is_match(line))
        .map(|(idx, _)| return idx)
        .collect();

    let Some(&first_heading) = heading_indices.first() else {
        return Vec::new();
    };

    let mut starts: Vec<usize> = Vec::with_capacity(heading_indices.len().saturating_add(1));
    if first_heading > 0 {
        starts.push(0);
    }
    starts.extend(heading_indices.iter().copied());

    let mut sections = Vec::new();
    for (pos, &start) in starts.iter().enumerate() {
        if sections.len() >= max_sections {
            break;
        }
        let end = starts.get(pos.saturating_add(1)).copied().unwrap_or(lines.len());
        let Some(window) = lines.get(start..end) else {
            continue;
        };
        let section_text = window.join("\n");
        if !patterns.is_match(&section_text) {
            continue;
        }

        let heading = window.first().map_or(UNTITLED_SECTION, |line| return heading_text(line));
        sections.push(Section {
            content: section_text,
            end_line: end,
            label: format!("Section: {heading}"),
            start_line: start.saturating_add(1),
        });
    }

    return sections;
}

/// Windows of `context_lines` around every matching line, merged and capped.
pub fn extract_windows(
    lines: &[&str],
    patterns: &ReferencePatternSet,
    context_lines: usize,
    max_sections: usize,
) -> Vec<Section> {
    let hit_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| return patterns.is_match(line))
        .map(|(idx, _)| return idx)
        .collect();

    let ranges = hit_windows(&hit_lines, context_lines, lines.len());
    return merge_ranges(ranges)
        .into_iter()
        .take(max_sections)
        .filter_map(|(start, end)| {
            let window = lines.get(start..end)?;
            return Some(Section {
                content: window.join("\n"),
                end_line: end,
                label: format!("Reference lines {}-{end}", start.saturating_add(1)),
                start_line: start.saturating_add(1),
            });
        })
        .collect();
}

/// Zero-based half-open windows around each hit, clamped to `[0, line_count)`.
pub fn hit_windows(hit_lines: &[usize], context_lines: usize, line_count: usize) -> Vec<(usize, usize)> {
    return hit_lines
        .iter()
        .map(|&idx| {
            let start = idx.saturating_sub(context_lines);
            let end = idx.saturating_add(context_lines).saturating_add(1).min(line_count);
            return (start, end);
        })
        .collect();
}

/// Sort half-open ranges and merge any that overlap or touch.
/// A range whose start is at or before the current end is absorbed.
pub fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    return merged;
}

/// Split text into lines on `\n`, `\r\n`, a lone `\r`, and the other
/// Unicode line boundaries. A trailing break does not start an empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if !is_line_break(ch) {
            continue;
        }
        lines.push(text.get(start..idx).unwrap_or_default());
        start = idx.saturating_add(ch.len_utf8());
        if ch == '\r' && chars.peek().is_some_and(|&(_, next)| return next == '\n') {
            chars.next();
            start = start.saturating_add(1);
        }
    }
    if start < text.len() {
        lines.push(text.get(start..).unwrap_or_default());
    }
    return lines;
}

/// Heading text of a heading line, or the untitled label.
fn heading_text(line: &str) -> &str {
    return HEADING_PATTERN
        .captures(line)
        .and_then(|cap| return cap.get(1))
        .map(|m| return m.as_str().trim())
        .filter(|text| return !text.is_empty())
        .unwrap_or(UNTITLED_SECTION);
}

/// Characters that end a line.
fn is_line_break(ch: char) -> bool {
    return matches!(ch, '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}'..='\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}');
}

/// Markdown files are split on headings before falling back to line windows.
fn is_heading_structured(path: &Path) -> bool {
    return matches!(extension_of(path).as_str(), "markdown" | "md");
}
