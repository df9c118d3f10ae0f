use memchr::memmem;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Offset of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    memmem::find(haystack, needle)
}

/// Split `haystack` on every occurrence of `delimiter`.
///
/// A haystack without the delimiter comes back as a single part.
pub(crate) fn split<'a>(haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    split_n(haystack, delimiter, usize::MAX)
}

/// Split `haystack` on `delimiter` into at most `max_parts` parts.
///
/// Once `max_parts - 1` parts have been cut the remaining bytes form the final
/// part, whether or not they contain the delimiter.
pub(crate) fn split_n<'a>(haystack: &'a [u8], delimiter: &[u8], max_parts: usize) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = haystack;
    while parts.len() + 1 < max_parts
        && let Some(pos) = find(rest, delimiter)
    {
        parts.push(&rest[..pos]);
        rest = &rest[pos + delimiter.len()..];
    }
    parts.push(rest);
    parts
}
