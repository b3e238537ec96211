//! Lexical cursor over formula text
//!
//! One character of lookahead. [`Scanner::advance`] either skips whitespace
//! after the consumed character or not; the raw mode is used inside quoted
//! literals so embedded spaces survive.

pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    /// Cursor positioned on the first non-whitespace character
    pub fn new(text: &str) -> Self {
        let mut scanner = Self {
            chars: text.chars().collect(),
            pos: 0,
        };
        scanner.skip_whitespace();
        scanner
    }

    /// Current character, `None` once the input is exhausted
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Consume the current character
    pub fn advance(&mut self, skip_whitespace: bool) {
        if self.is_done() {
            return;
        }
        self.pos += 1;
        if skip_whitespace {
            self.skip_whitespace();
        }
    }

    /// Character offset of the current character
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unconsumed input, for diagnostics
    pub fn rest(&self) -> String {
        self.chars[self.pos.min(self.chars.len())..].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_leading_whitespace() {
        let s = Scanner::new("  \t\n1");
        assert_eq!(s.peek(), Some('1'));
        assert_eq!(s.position(), 4);
    }

    #[test]
    fn test_advance_modes() {
        let mut s = Scanner::new("a  b");
        s.advance(false);
        assert_eq!(s.peek(), Some(' '));

        let mut s = Scanner::new("a  b");
        s.advance(true);
        assert_eq!(s.peek(), Some('b'));
        assert_eq!(s.rest(), "b");

        s.advance(true);
        assert!(s.is_done());
        assert_eq!(s.peek(), None);
        assert_eq!(s.rest(), "");

        // Advancing past the end is a no-op
        s.advance(true);
        assert!(s.is_done());
    }

    #[test]
    fn test_empty_input() {
        let s = Scanner::new("   ");
        assert!(s.is_done());
    }
}
