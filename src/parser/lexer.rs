//! G-code word scanner
//!
//! Finds letter-prefixed numeric words (`X12.5`, `G1`, `M3`) in a raw line.
//! Whitespace between a letter and its number is ignored, the outermost
//! parenthesised comment is skipped, and `,` is accepted as decimal
//! separator. Every word remembers where it sits in the raw line so the
//! rewriter can splice new values in without touching anything else.

use std::num::ParseFloatError;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?[0-9]*[.,]?[0-9]+").expect("numeric word pattern is valid")
});

/// A letter followed by a number, located in the raw line
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Uppercased letter code
    pub letter: char,
    /// Numeric text exactly as matched (whitespace removed, `,` kept)
    pub text: String,
    /// Byte offset of the letter in the raw line
    pub letter_at: usize,
    /// Byte range of the numeric text in the raw line
    pub value_span: Range<usize>,
}

impl Word {
    /// Byte range from the letter through the end of the number.
    pub fn span(&self) -> Range<usize> {
        self.letter_at..self.value_span.end
    }

    /// Normalised numeric text (`.` separator) used as the code suffix, e.g. `G` + `38.2`.
    pub fn code(&self) -> String {
        format!("{}{}", self.letter, self.text.replace(',', "."))
    }

    pub fn value(&self) -> Result<f64, ParseFloatError> {
        self.text.replace(',', ".").parse()
    }
}

/// Byte range of the outermost comment: first `(` through last `)`.
///
/// Nested or repeated comments are not handled individually; everything
/// between the outermost delimiters counts as one span.
pub fn comment_span(line: &str) -> Option<Range<usize>> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    (close > open).then(|| open..close + 1)
}

/// Scan every letter-prefixed number in `line`, in order of appearance.
///
/// A number is only a word if the character right before it (ignoring
/// whitespace) is an ASCII letter. A number at the very start of the line
/// has no letter and is skipped.
pub fn scan_words(line: &str) -> Vec<Word> {
    let comment = comment_span(line);

    // Uppercased, whitespace-free copy of the line outside the comment,
    // plus the raw byte offset behind every compact byte.
    let mut compact = String::with_capacity(line.len());
    let mut origins = Vec::with_capacity(line.len());
    for (idx, ch) in line.char_indices() {
        if ch.is_whitespace() || comment.as_ref().is_some_and(|span| span.contains(&idx)) {
            continue;
        }
        let upper = ch.to_ascii_uppercase();
        compact.push(upper);
        origins.extend(std::iter::repeat_n(idx, upper.len_utf8()));
    }

    let mut words = Vec::new();
    for found in NUMBER.find_iter(&compact) {
        if found.start() == 0 {
            continue;
        }
        let Some(letter) = compact[..found.start()].chars().next_back() else {
            continue;
        };
        if !letter.is_ascii_alphabetic() {
            continue;
        }

        words.push(Word {
            letter,
            text: found.as_str().to_string(),
            letter_at: origins[found.start() - 1],
            // the last matched byte is an ASCII digit
            value_span: origins[found.start()]..origins[found.end() - 1] + 1,
        });
    }

    words
}

/// First word carrying `letter`.
pub fn first_word(words: &[Word], letter: char) -> Option<&Word> {
    let letter = letter.to_ascii_uppercase();
    words.iter().find(|word| word.letter == letter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_simple_move() {
        let words = scan_words("G1 X10 Y-2.5 Z0.3");
        let codes: Vec<_> = words.iter().map(Word::code).collect();
        assert_eq!(codes, vec!["G1", "X10", "Y-2.5", "Z0.3"]);
    }

    #[test]
    fn test_spans_point_into_raw_line() {
        let line = "g1 x 10.5  y2";
        let words = scan_words(line);
        assert_eq!(words.len(), 3);

        let x = &words[1];
        assert_eq!(x.letter, 'X');
        assert_eq!(&line[x.value_span.clone()], "10.5");
        assert_eq!(&line[x.span()], "x 10.5");
        assert_eq!(&line[words[2].span()], "y2");
    }

    #[test]
    fn test_comma_separator() {
        let words = scan_words("X1,25");
        assert_eq!(words[0].value().unwrap(), 1.25);
        assert_eq!(words[0].code(), "X1.25");
    }

    #[test]
    fn test_leading_number_is_skipped() {
        let words = scan_words("12 X3");
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].letter, 'X');
    }

    #[test]
    fn test_non_letter_prefix_is_ignored() {
        let words = scan_words("#100=5 X1");
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].code(), "X1");
    }

    #[test]
    fn test_outermost_comment_is_skipped() {
        let words = scan_words("G0 (move (to) X99) X1");
        let codes: Vec<_> = words.iter().map(Word::code).collect();
        assert_eq!(codes, vec!["G0", "X1"]);
    }

    #[test]
    fn test_unbalanced_parens_are_not_a_comment() {
        assert_eq!(comment_span(") X1 ("), None);
        assert_eq!(comment_span("X1 (open"), None);
        assert_eq!(comment_span("X1 (a)"), Some(3..6));
    }

    #[test]
    fn test_decimal_codes() {
        let words = scan_words("G38.2 Z-1 F100");
        assert_eq!(words[0].code(), "G38.2");
        assert_eq!(first_word(&words, 'f').map(|w| w.text.as_str()), Some("100"));
        assert!(first_word(&words, 'Y').is_none());
    }
}
