/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same
/// value, so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Splits on `\n`, dropping a trailing `\r`. Yields `(1-based line number,
/// line bytes)`. A final empty segment after the last newline is not yielded.
pub fn lines(bytes: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    let trailing_newline = bytes.last() == Some(&b'\n');
    let count = bytes.split(|&b| b == b'\n').count();
    let keep = if trailing_newline || bytes.is_empty() { count - 1 } else { count };
    bytes
        .split(|&b| b == b'\n')
        .take(keep)
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix(b"\r").unwrap_or(line)))
}

/// Field at byte range `start..end` of a fixed-width Latin-1 record, trimmed.
/// Ranges past the end of a short line are clamped; an absent field is empty.
pub fn fixed_field(line: &[u8], start: usize, end: usize) -> String {
    let end = end.min(line.len());
    if start >= end {
        return String::new();
    }
    decode_latin1(&line[start..end]).trim().to_string()
}

pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}
