//! Lookup in sorted `i64` arrays.

/// Below this many candidates the search switches from bisection to a linear scan.
const LINEAR_TAIL: usize = 4;

/// Returns the index of `needle` in the ascending slice `ary`, or `None`.
///
/// Both ends are checked first, then the window is bisected until at most
/// `LINEAR_TAIL` candidates remain, which are scanned in order. With duplicates any matching
/// index may be returned.
pub fn find_in_sorted(needle: i64, ary: &[i64]) -> Option<usize> {
    let (&first, &last) = (ary.first()?, ary.last()?);
    let mut bot = 0usize;
    let mut top = ary.len() - 1;

    if needle == first {
        return Some(bot);
    }
    if needle == last {
        return Some(top);
    }
    while top - bot + 1 > LINEAR_TAIL {
        let mid = bot + (top - bot) / 2;
        if needle == ary[mid] {
            return Some(mid);
        }
        if needle < ary[mid] {
            top = mid;
        } else {
            bot = mid;
        }
    }
    (bot..=top).find(|&k| ary[k] == needle)
}
