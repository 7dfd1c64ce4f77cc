//! The syntax module is the parsing core shared by the assembler and the
//! high-level language front end.
//!
//! Every grammar production is written as a single call to
//! `Grammar::parse`, which gives it automatic backtracking: a production
//! that returns `None` leaves the cursor exactly where it found it, so
//! the caller can try the next alternative on the same input.
//! A production that is certain of its interpretation and still fails
//! records a diagnostic on the cursor before returning `None`.

pub mod cursor;

use self::cursor::Cursor;

pub trait Grammar: Sized {
    fn cursor(&mut self) -> &mut Cursor;

    /// Skips trivia, then runs `body` with the position where the
    /// production begins. If `body` returns `None` the cursor is rolled
    /// back to where it was before the trivia was skipped.
    fn parse<T, F>(&mut self, body: F) -> Option<T>
    where
        F: FnOnce(&mut Self, usize) -> Option<T>,
    {
        let start = self.cursor().mark();
        self.cursor().skip_trivia();
        let begin = self.cursor().mark();
        let result = body(self, begin);
        if result.is_none() {
            self.cursor().rollback(start);
        }
        result
    }

    /// A run of characters which does not start with a digit and contains
    /// no whitespace, colon or comment marker. Used for label names.
    fn word(&mut self) -> Option<String> {
        self.parse(|g, _| {
            let cursor = g.cursor();
            let first = cursor.peek();
            if cursor.eof() || first.is_whitespace() || first == ':' || first.is_ascii_digit() {
                return None;
            }
            let mut word = String::new();
            while !cursor.eof()
                && !cursor.peek().is_whitespace()
                && cursor.peek() != ':'
                && !cursor.at_line_comment()
            {
                word.push(cursor.next());
            }
            Some(word)
        })
    }

    /// An unsigned literal in decimal, hexadecimal (`0x`) or binary (`0b`).
    ///
    /// Without a prefix a missing digit is just "not a number". After an
    /// explicit prefix it is an error.
    fn number(&mut self) -> Option<i64> {
        self.parse(|g, _| {
            let cursor = g.cursor();
            let base = if cursor.match_with("0x", false) {
                16
            } else if cursor.match_with("0b", false) {
                2
            } else {
                10
            };

            let mut value = match cursor.peek().to_digit(base) {
                Some(digit) => i64::from(digit),
                None => {
                    if base != 10 {
                        cursor.error("Literal expected after prefix");
                    }
                    return None;
                }
            };
            cursor.next();

            while let Some(digit) = cursor.peek().to_digit(base) {
                cursor.next();
                value = match value
                    .checked_mul(i64::from(base))
                    .and_then(|v| v.checked_add(i64::from(digit)))
                {
                    Some(value) => value,
                    None => {
                        cursor.error("Literal is too large");
                        return None;
                    }
                };
            }
            Some(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare {
        cursor: Cursor,
    }

    impl Grammar for Bare {
        fn cursor(&mut self) -> &mut Cursor {
            &mut self.cursor
        }
    }

    fn bare(source: &str) -> Bare {
        Bare { cursor: Cursor::new(source, Some("#")) }
    }

    #[test]
    fn test_parse_rolls_back_whitespace() {
        let mut g = bare("   \n  # comment\n  foo");
        let result: Option<()> = g.parse(|g, begin| {
            assert_eq!(begin, 18);
            assert!(g.cursor.match_str("foo"));
            None
        });
        assert_eq!(result, None);
        assert_eq!(g.cursor.mark(), 0);

        let result = g.parse(|g, begin| if g.cursor.match_str("foo") { Some(begin) } else { None });
        assert_eq!(result, Some(18));
        assert!(g.cursor.eof());
    }

    #[test]
    fn test_nested_failure_restores_inner_start() {
        let mut g = bare("a b c");
        let outer = g.parse(|g, _| {
            assert!(g.cursor.match_str("a"));
            let inner: Option<()> = g.parse(|g, _| {
                g.cursor.match_str("b");
                None
            });
            assert!(inner.is_none());
            assert_eq!(g.cursor.mark(), 1);
            Some(())
        });
        assert!(outer.is_some());
    }

    #[test]
    fn test_word() {
        let mut g = bare("  loop: next");
        assert_eq!(g.word(), Some("loop".to_owned()));
        assert!(g.cursor.match_str(":"));
        assert_eq!(g.word(), Some("next".to_owned()));
        assert_eq!(g.word(), None);

        assert_eq!(bare("9lives").word(), None);
        assert_eq!(bare(":x").word(), None);
        assert_eq!(bare("").word(), None);
        assert_eq!(bare("a9_b#comment").word(), Some("a9_b".to_owned()));
    }

    #[test]
    fn test_number_bases() {
        assert_eq!(bare("146").number(), Some(146));
        assert_eq!(bare("0").number(), Some(0));
        assert_eq!(bare(" 0x46").number(), Some(0x46));
        assert_eq!(bare("0xfF").number(), Some(0xFF));
        assert_eq!(bare("0b10010010").number(), Some(0b1001_0010));

        // Maximal munch stops at the first non-digit.
        let mut g = bare("0b1012");
        assert_eq!(g.number(), Some(0b101));
        assert_eq!(g.cursor.peek(), '2');
    }

    #[test]
    fn test_number_not_a_number_is_silent() {
        let mut g = bare("  loop");
        assert_eq!(g.number(), None);
        assert_eq!(g.cursor.mark(), 0);
        assert_eq!(g.cursor.errors(), 0);
    }

    #[test]
    fn test_number_missing_digits_after_prefix() {
        let mut g = bare("0x");
        assert_eq!(g.number(), None);
        assert_eq!(g.cursor.mark(), 0);
        assert_eq!(g.cursor.errors(), 1);

        let mut g = bare("0b2");
        assert_eq!(g.number(), None);
        assert_eq!(g.cursor.diagnostics()[0].message, "Literal expected after prefix");
    }

    #[test]
    fn test_number_overflow() {
        let mut g = bare("99999999999999999999999");
        assert_eq!(g.number(), None);
        assert_eq!(g.cursor.errors(), 1);
        assert_eq!(g.cursor.diagnostics()[0].message, "Literal is too large");
    }
}
