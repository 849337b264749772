//! Boyer-Moore-Horspool search over a [`RingBuffer`], plus the partial-suffix
//! probe used while streaming a part's body.

use crate::needle::Needle;
use crate::ring_buffer::RingBuffer;

/// Outcome of [`Scanner::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanResult {
    /// A full match was found; `buffer.start()`/`buffer.end()` bound it.
    Found,
    /// No full match; `buffer.start()`/`buffer.end()` bound the prefix that is
    /// safe to emit without risking a split match.
    NotFound,
}

/// Stateless search logic over a [`RingBuffer`]'s live window.
///
/// The scanner never mutates buffer contents; it only records match indices
/// via [`RingBuffer::set_match`] for the caller to act on.
#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    /// Boyer-Moore-Horspool search for `needle` within `buffer.window()[buffer.start()..]`.
    pub fn find(&self, buffer: &mut RingBuffer, needle: &Needle) -> ScanResult {
        let valid = buffer.valid();
        let window = buffer.window();
        let last = needle.last();
        let pattern = needle.pattern();

        let mut i = buffer.start() + last;
        while i < valid {
            let mut k = 0usize;
            let mut matched = true;
            while k <= last {
                if window[i - k] != pattern[last - k] {
                    matched = false;
                    break;
                }
                k += 1;
            }
            if matched {
                buffer.set_match(i - last, i + 1);
                return ScanResult::Found;
            }
            i += needle.skip(window[i]);
        }

        let safe_start = valid.saturating_sub(last);
        buffer.set_match(safe_start, safe_start);
        ScanResult::NotFound
    }

    /// Partial-suffix probe: called only when [`Scanner::find`] returned
    /// `NotFound` and the caller is streaming a part body (where emitting a
    /// false-positive prefix would corrupt the boundary scan).
    ///
    /// Tightens `buffer`'s recorded `start`/`end` to the earliest index at
    /// which the live window's tail could still be the start of `needle`.
    pub fn probe_partial_suffix(&self, buffer: &mut RingBuffer, needle: &Needle) {
        let valid = buffer.valid();
        if valid == 0 {
            return;
        }
        let window = buffer.window();
        let last_byte = window[valid - 1];

        for &p in needle.loc(last_byte).iter().rev() {
            let suffix_len = p + 1;
            if suffix_len > valid {
                continue;
            }
            let candidate = &window[valid - suffix_len..valid];
            if candidate == &needle.pattern()[..suffix_len] {
                let start = valid - suffix_len;
                buffer.set_match(start, start);
                return;
            }
        }
        // No partial suffix matches: the whole live region is safe to emit.
        buffer.set_match(valid, valid);
    }
}
