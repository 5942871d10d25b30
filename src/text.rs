//! Escape-aware text layout primitives.
//!
//! Rendered lines mix visible text with ANSI CSI sequences (`ESC [ ... final`), which
//! occupy zero columns on the terminal. Everything here measures and cuts strings by
//! *visible* length so that colorized fields still line up.
//!
//! A lone `ESC` that is not followed by `[` is not an escape sequence: it and the char
//! after it are counted as two ordinary visible chars. An `ESC` at the very end of a
//! string has no follower and counts as nothing.

use std::{borrow::Cow, cmp::Ordering};

use crate::error::LayoutError;

const ESC: char = '\x1b';
const CSI_START: char = '[';

#[derive(Clone, Copy)]
enum Scan {
    Plain,
    /// Saw `ESC`, don't yet know whether it starts a CSI sequence.
    Escape,
    Csi,
}

const fn is_final_byte(c: char) -> bool {
    matches!(c, '@'..='~')
}

/// Which side of its field a string hugs when padded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Align {
    /// Text on the left, padding on the right.
    #[default]
    Left,
    /// Padding on the left, text on the right.
    Right,
}

/// Counts the chars of `s`, ignoring ANSI CSI sequences.
#[must_use]
pub fn visible_len(s: &str) -> usize {
    let mut count = 0;
    let mut state = Scan::Plain;

    for c in s.chars() {
        state = match state {
            Scan::Plain if c == ESC => Scan::Escape,
            Scan::Plain => {
                count += 1;
                Scan::Plain
            }
            Scan::Escape if c == CSI_START => Scan::Csi,
            Scan::Escape => {
                // false positive: neither the ESC nor this char were counted yet
                count += 2;
                Scan::Plain
            }
            Scan::Csi if is_final_byte(c) => Scan::Plain,
            Scan::Csi => Scan::Csi,
        };
    }
    count
}

/// Cuts `s` down to at most `limit` visible chars.
///
/// Escape sequences are copied through even past the cut, so trailing resets survive.
/// A stray `ESC` and its follower are kept or dropped together, which may leave the
/// result one char short of `limit`.
/// Returns the (possibly borrowed) result and whether anything was removed.
#[must_use]
pub fn truncate(s: &str, limit: usize) -> (Cow<'_, str>, bool) {
    if visible_len(s) <= limit {
        return (Cow::Borrowed(s), false);
    }

    let mut out = String::with_capacity(s.len());
    let mut count = 0;
    let mut state = Scan::Plain;

    for c in s.chars() {
        state = match state {
            Scan::Plain if c == ESC => Scan::Escape,
            Scan::Plain => {
                if count < limit {
                    out.push(c);
                    count += 1;
                }
                Scan::Plain
            }
            Scan::Escape if c == CSI_START => {
                // the ESC is held back until we know it opens a sequence
                out.push(ESC);
                out.push(c);
                Scan::Csi
            }
            Scan::Escape => {
                // the pair is kept whole or not at all
                if count + 2 <= limit {
                    out.push(ESC);
                    out.push(c);
                    count += 2;
                } else {
                    count = limit;
                }
                Scan::Plain
            }
            Scan::Csi => {
                out.push(c);
                if is_final_byte(c) { Scan::Plain } else { Scan::Csi }
            }
        };
    }

    (Cow::Owned(out), true)
}

/// Splits `s` into pieces of at most `width` visible chars.
///
/// Escape sequences stay with the piece they appear in; a stray `ESC` pair is never
/// split. A `width` of zero returns `s` whole.
pub(crate) fn wrap(s: &str, width: usize) -> Vec<String> {
    if width == 0 || visible_len(s) <= width {
        return vec![s.to_owned()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut count = 0;
    let mut state = Scan::Plain;

    let mut make_room = |piece: &mut String, count: &mut usize, cells: usize| {
        if *count > 0 && *count + cells > width {
            pieces.push(std::mem::take(piece));
            *count = 0;
        }
        *count += cells;
    };

    for c in s.chars() {
        state = match state {
            Scan::Plain if c == ESC => Scan::Escape,
            Scan::Plain => {
                make_room(&mut piece, &mut count, 1);
                piece.push(c);
                Scan::Plain
            }
            Scan::Escape if c == CSI_START => {
                piece.push(ESC);
                piece.push(c);
                Scan::Csi
            }
            Scan::Escape => {
                make_room(&mut piece, &mut count, 2);
                piece.push(ESC);
                piece.push(c);
                Scan::Plain
            }
            Scan::Csi => {
                piece.push(c);
                if is_final_byte(c) { Scan::Plain } else { Scan::Csi }
            }
        };
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Forces `s` to exactly `width` visible chars.
///
/// Short strings are padded with spaces opposite `align`. Long strings are truncated
/// and end with `ellipsis`.
///
/// # Errors
///
/// Returns [`LayoutError::EllipsisTooWide`] if `ellipsis` is wider than `width`.
pub fn resize<'a>(
    s: &'a str,
    ellipsis: &str,
    width: usize,
    align: Align,
) -> Result<Cow<'a, str>, LayoutError> {
    check_ellipsis(ellipsis, width)?;
    Ok(fit(s, ellipsis, width, align))
}

/// Verifies that `ellipsis` fits into a `width`-column field.
pub(crate) fn check_ellipsis(ellipsis: &str, width: usize) -> Result<(), LayoutError> {
    if visible_len(ellipsis) > width {
        return Err(LayoutError::EllipsisTooWide {
            ellipsis: ellipsis.into(),
            width,
        });
    }
    Ok(())
}

/// [`resize`] for an ellipsis already known to fit.
pub(crate) fn fit<'a>(s: &'a str, ellipsis: &str, width: usize, align: Align) -> Cow<'a, str> {
    let len = visible_len(s);

    match len.cmp(&width) {
        Ordering::Equal => Cow::Borrowed(s),
        Ordering::Less => {
            let pad = " ".repeat(width - len);
            Cow::Owned(match align {
                Align::Left => format!("{s}{pad}"),
                Align::Right => format!("{pad}{s}"),
            })
        }
        Ordering::Greater => {
            let (head, _) = truncate(s, width.saturating_sub(visible_len(ellipsis)));
            // a stray ESC pair cut at the limit leaves the head one short
            let pad = " ".repeat(
                width
                    .saturating_sub(visible_len(&head))
                    .saturating_sub(visible_len(ellipsis)),
            );
            Cow::Owned(match align {
                Align::Left => format!("{head}{ellipsis}{pad}"),
                Align::Right => format!("{pad}{head}{ellipsis}"),
            })
        }
    }
}
