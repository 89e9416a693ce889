//! Line ending helpers.
//!
//! A [`Document`](crate::Document) stores text with LF (`'\n'`) breaks only: the line index and
//! the lexer never see `'\r'`. Files using CRLF are normalized on load and the original ending is
//! remembered for saving.

/// The newline sequence a document is saved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// Detect the line ending of a source text.
    ///
    /// Any CRLF makes the text [`LineEnding::Crlf`]; everything else is [`LineEnding::Lf`].
    pub fn detect_in_text(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::Crlf
        } else {
            Self::Lf
        }
    }

    /// Convert CRLF and lone CR breaks to LF.
    pub fn normalize(text: &str) -> String {
        if !text.contains('\r') {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\r' {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Convert an LF-normalized text to this line ending for saving.
    pub fn apply_to_text(self, text: &str) -> String {
        match self {
            Self::Lf => text.to_string(),
            Self::Crlf => text.replace('\n', "\r\n"),
        }
    }

    /// The newline sequence itself.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(LineEnding::detect_in_text("a\nb"), LineEnding::Lf);
        assert_eq!(LineEnding::detect_in_text("a\r\nb\n"), LineEnding::Crlf);
        assert_eq!(LineEnding::detect_in_text(""), LineEnding::Lf);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(LineEnding::normalize("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(LineEnding::normalize("\r\r\n"), "\n\n");
        assert_eq!(LineEnding::normalize("plain"), "plain");
    }

    #[test]
    fn test_apply_round_trip() {
        let source = "one\r\ntwo\r\n";
        let ending = LineEnding::detect_in_text(source);
        let normalized = LineEnding::normalize(source);
        assert_eq!(ending.apply_to_text(&normalized), source);
    }
}
