//! Bracket-balance scanner for inline data literals
//!
//! The album payload sits inside a `<script>` block with no delimiter other
//! than its own balanced brackets. These helpers isolate that span; parsing
//! it is left to [`LooseValue`](crate::value::LooseValue).

/// Byte offset of the first `[` at or after `from`.
pub fn find_array_start(input: &str, from: usize) -> Option<usize> {
    input
        .get(from..)?
        .bytes()
        .position(|b| b == b'[')
        .map(|offset| from + offset)
}

/// Exclusive end offset of the array that opens at `start`.
///
/// Brackets inside double-quoted strings are ignored, and a backslash always
/// consumes the following byte. Returns `None` when depth never returns to
/// zero.
pub fn find_array_end(input: &str, start: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }

        match b {
            b'\\' => escaped = true,
            b'"' => in_string = !in_string,
            b'[' if !in_string => depth += 1,
            b']' if !in_string => {
                // A stray `]` before the first `[` cannot close anything
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Outcome of [`balanced_array_span`] when no span can be isolated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanError {
    NoStart,
    Unbalanced,
}

/// The first balanced `[...]` span at or after `from`.
pub fn balanced_array_span(input: &str, from: usize) -> Result<&str, SpanError> {
    let start = find_array_start(input, from).ok_or(SpanError::NoStart)?;
    let end = find_array_end(input, start).ok_or(SpanError::Unbalanced)?;
    // Both offsets sit on ASCII bytes, so they are char boundaries.
    Ok(&input[start..end])
}
