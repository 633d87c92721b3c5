//! Single-line rewrite.

use std::borrow::Cow;

use crate::format::number;
use crate::grid::ProbeGrid;
use crate::parser::lexer::{first_word, scan_words};
use crate::parser::Position;

/// Rewrite one line given the machine position after it.
///
/// Only cutting lines change. The Z word's number is replaced with the
/// compensated depth; a line without Z but with a Y (else X) word gets a
/// `Z` word inserted right after that word. Lines with no X/Y/Z word stay
/// as they are, as does everything around the edited word.
pub fn rewrite_line<'a>(grid: &ProbeGrid, line: &'a str, position: Position) -> Cow<'a, str> {
    let Some(point) = position.point() else {
        return Cow::Borrowed(line);
    };
    if point.z >= 0.0 {
        return Cow::Borrowed(line);
    }

    let words = scan_words(line);
    let depth = number(grid.height_at(point) + point.z);

    if let Some(z) = first_word(&words, 'Z') {
        let span = z.value_span.clone();
        return Cow::Owned(format!("{}{}{}", &line[..span.start], depth, &line[span.end..]));
    }

    match first_word(&words, 'Y').or_else(|| first_word(&words, 'X')) {
        Some(word) => {
            let end = word.value_span.end;
            Cow::Owned(format!("{} Z{}{}", &line[..end], depth, &line[end..]))
        }
        None => Cow::Borrowed(line),
    }
}
