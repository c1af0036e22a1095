//! 结果缓冲区内的查找
//!
//! 字面量、大小写不敏感、不跨行。单次查找不回绕，回绕由调用方决定。

use regex::{Match, Regex, RegexBuilder};
use ropey::Rope;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// A match inside the buffer, in char offsets. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferMatch {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl BufferMatch {
    pub fn overlaps(&self, other: &BufferMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedMatch {
    pub found: BufferMatch,
    pub wrapped: bool,
}

fn literal_matcher(text: &str) -> Option<Regex> {
    if text.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(text))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Forward: first match starting at or after `from`.
/// Backward: last match starting strictly before `from`.
pub fn find_next(
    buffer: &Rope,
    from: usize,
    text: &str,
    direction: SearchDirection,
) -> Option<BufferMatch> {
    let matcher = literal_matcher(text)?;
    match direction {
        SearchDirection::Forward => find_forward(buffer, from, &matcher),
        SearchDirection::Backward => find_backward(buffer, from, &matcher),
    }
}

/// Retries from the opposite boundary when nothing is found past `from`.
pub fn find_wrapping(
    buffer: &Rope,
    from: usize,
    text: &str,
    direction: SearchDirection,
) -> Option<WrappedMatch> {
    if let Some(found) = find_next(buffer, from, text, direction) {
        return Some(WrappedMatch {
            found,
            wrapped: false,
        });
    }
    let restart = match direction {
        SearchDirection::Forward => 0,
        SearchDirection::Backward => buffer.len_chars(),
    };
    find_next(buffer, restart, text, direction).map(|found| WrappedMatch {
        found,
        wrapped: true,
    })
}

fn find_forward(buffer: &Rope, from: usize, matcher: &Regex) -> Option<BufferMatch> {
    let total = buffer.len_chars();
    if from > total {
        return None;
    }
    let first_line = buffer.char_to_line(from);
    for line_idx in first_line..buffer.len_lines() {
        let line_start = buffer.line_to_char(line_idx);
        let line = line_text(buffer, line_idx);
        let at = char_to_byte(&line, from.saturating_sub(line_start));
        if let Some(m) = matcher.find_at(&line, at) {
            return Some(to_buffer_match(&line, line_start, line_idx, m));
        }
    }
    None
}

fn find_backward(buffer: &Rope, from: usize, matcher: &Regex) -> Option<BufferMatch> {
    let from = from.min(buffer.len_chars());
    let last_line = buffer.char_to_line(from);
    for line_idx in (0..=last_line).rev() {
        let line_start = buffer.line_to_char(line_idx);
        let line = line_text(buffer, line_idx);
        let mut best = None;
        let mut at = 0;
        // 逐字符推进起点，重叠的命中也要算
        while let Some(m) = matcher.find_at(&line, at) {
            let found = to_buffer_match(&line, line_start, line_idx, m);
            if found.start >= from {
                break;
            }
            best = Some(found);
            at = m.start() + line[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

fn to_buffer_match(line: &str, line_start: usize, line_idx: usize, m: Match<'_>) -> BufferMatch {
    let start = line_start + line[..m.start()].chars().count();
    BufferMatch {
        start,
        end: start + m.as_str().chars().count(),
        line: line_idx,
    }
}

fn char_to_byte(line: &str, chars: usize) -> usize {
    line.char_indices()
        .nth(chars)
        .map_or(line.len(), |(idx, _)| idx)
}

fn is_extra_break(c: char) -> bool {
    matches!(c, '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// Maps every line break `Rope` knows besides LF and CRLF to a space, one
/// char for one char, so rope line numbers match LF-counted line numbers.
pub fn normalize_line_breaks(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let needs_work = text
        .char_indices()
        .any(|(i, c)| is_extra_break(c) || (c == '\r' && bytes.get(i + 1) != Some(&b'\n')));
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => out.push(c),
            '\r' => out.push(' '),
            c if is_extra_break(c) => out.push(' '),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Line content without its terminator.
fn line_text(buffer: &Rope, line_idx: usize) -> Cow<'_, str> {
    let line = buffer.line(line_idx);
    let text: Cow<'_, str> = line.into();
    match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim_end_matches(['\n', '\r'])),
        Cow::Owned(s) => Cow::Owned(s.trim_end_matches(['\n', '\r']).to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/buffer_search.rs"]
mod tests;
