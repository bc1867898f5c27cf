//! Scalar reference search: the oracle every other variant is judged against.
//!
//! The implementation is the textbook halving loop over inclusive bounds.
//! It is deliberately left unoptimized: equivalence of every other strategy
//! is defined relative to its output, so changing it changes what "correct"
//! means for the whole crate.

/// Sentinel returned by every search variant when the key is absent.
pub const NOT_FOUND: i64 = -1;

/// Classic binary search over a strictly ascending slice.
///
/// Returns the index of `key` in `values`, or [`NOT_FOUND`].
pub fn binary_search_reference(values: &[i64], key: i64) -> i64 {
    search_range(values, key, 0, values.len() as i64 - 1)
}

/// Halving search restricted to the inclusive range `[left, right]`.
///
/// Shared by the reference search and the scalar finishing phase of the
/// quaternary search. Callers guarantee `0 <= left` and `right < values.len()`
/// whenever `left <= right`.
#[inline]
pub(crate) fn search_range(values: &[i64], key: i64, mut left: i64, mut right: i64) -> i64 {
    while left <= right {
        let mid = left + (right - left) / 2;
        let value = values[mid as usize];

        if value == key {
            return mid;
        } else if value < key {
            left = mid + 1;
        } else {
            right = mid - 1;
        }
    }

    NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evens(len: usize) -> Vec<i64> {
        (0..len as i64).map(|i| i * 2).collect()
    }

    #[test]
    fn finds_every_present_value() {
        let values = evens(100);
        for (idx, &value) in values.iter().enumerate() {
            assert_eq!(binary_search_reference(&values, value), idx as i64);
        }
    }

    #[test]
    fn concrete_scenario() {
        let values = evens(100);
        assert_eq!(binary_search_reference(&values, 42), 21);
        assert_eq!(binary_search_reference(&values, 43), NOT_FOUND);
        assert_eq!(binary_search_reference(&values, -5), NOT_FOUND);
        assert_eq!(binary_search_reference(&values, 250), NOT_FOUND);
    }

    #[test]
    fn empty_and_single_element() {
        assert_eq!(binary_search_reference(&[], 0), NOT_FOUND);
        assert_eq!(binary_search_reference(&[42], 42), 0);
        assert_eq!(binary_search_reference(&[42], 43), NOT_FOUND);
        assert_eq!(binary_search_reference(&[42], 41), NOT_FOUND);
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let values = [i64::MIN, -1, 0, i64::MAX];
        assert_eq!(binary_search_reference(&values, i64::MIN), 0);
        assert_eq!(binary_search_reference(&values, i64::MAX), 3);
        assert_eq!(binary_search_reference(&values, 1), NOT_FOUND);
    }

    #[test]
    fn search_range_respects_bounds() {
        let values = evens(10);
        assert_eq!(search_range(&values, 4, 3, 9), NOT_FOUND);
        assert_eq!(search_range(&values, 8, 3, 9), 4);
        assert_eq!(search_range(&values, 8, 5, 4), NOT_FOUND);
    }
}
