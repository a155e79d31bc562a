/// How far before the middle a clause break may still be taken.
const LOOKBACK: usize = 10;

/// Splits a blessing into the left and right reveal panels, preferring a
/// clause break (`，` first, then `。`) near the middle. Works on chars, and
/// `left + right` is always the input.
pub(crate) fn split_blessing(text: &str) -> (&str, &str) {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();
    if len < 2 {
        return (text, "");
    }

    let mid = len / 2;
    let start = mid.saturating_sub(LOOKBACK);
    // a break on the final char would leave the right panel empty
    let find = |mark: char| {
        chars[start..len - 1]
            .iter()
            .position(|&(_, c)| c == mark)
            .map(|i| start + i + 1)
    };
    let at = find('，').or_else(|| find('。')).unwrap_or(mid);

    text.split_at(chars[at].0)
}
