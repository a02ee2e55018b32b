//! Relaying captured output back to the caller, optionally cut to a line limit.

use std::borrow::Cow;
use std::io::{self, Write};

/// Portion of `output` shown to the caller.
///
/// Lines are the segments between `\n` bytes. With a limit of `n` only the
/// first `n` segments are kept; when `mark_truncation` is set and something
/// was actually dropped, the first kept line carries a
/// `[TRUNCATED OUTPUT - <total> lines] ` prefix.
pub fn visible_output(output: &[u8], limit: Option<usize>, mark_truncation: bool) -> Cow<'_, [u8]> {
    let Some(limit) = limit else {
        return Cow::Borrowed(output);
    };

    let lines: Vec<&[u8]> = output.split(|byte| *byte == b'\n').collect();
    if lines.len() <= limit {
        return Cow::Borrowed(output);
    }

    let mut kept = lines[..limit].join(&b'\n');
    if mark_truncation && dropped_content(&lines[limit..]) {
        let marker = format!("[TRUNCATED OUTPUT - {} lines] ", line_count(&lines));
        kept = [marker.into_bytes(), kept].concat();
    }
    Cow::Owned(kept)
}

/// Write the visible output followed by one newline, then flush.
pub fn relay_output<W: Write>(
    out: &mut W,
    output: &[u8],
    limit: Option<usize>,
    mark_truncation: bool,
) -> io::Result<()> {
    out.write_all(&visible_output(output, limit, mark_truncation))?;
    out.write_all(b"\n")?;
    out.flush()
}

/// A lone empty segment after the final newline is not a dropped line.
fn dropped_content(dropped: &[&[u8]]) -> bool {
    dropped.len() > 1 || dropped.iter().any(|line| !line.is_empty())
}

fn line_count(lines: &[&[u8]]) -> usize {
    match lines.last() {
        Some(last) if last.is_empty() => lines.len() - 1,
        _ => lines.len(),
    }
}
