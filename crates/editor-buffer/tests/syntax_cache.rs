//! Syntax state cache validation
//!
//! Lexer states obtained lazily after arbitrary edits must equal the states of a from-scratch
//! scan, and re-lexing must stop as soon as the states reconverge.

use editor_buffer::{
    Chunk, Document, DocumentOptions, EditTransaction, ErrorKind, Lexer, LexerError, Resume,
    StateComparison, Token,
};
use pretty_assertions::assert_eq;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Comment,
    Word,
    Other,
}

/// Nested `/* */` comments reported as one token each, even across lines.
///
/// The state is the nesting depth. While a comment is open at the end of a line the token is
/// still pending, so the lexer asks for the comment's beginning as pre-scan context.
#[derive(Debug, Default)]
struct NestedCommentLexer {
    depth: u32,
    pos: usize,
    token_start: usize,
    lexed_lines: usize,
}

impl NestedCommentLexer {
    fn resume_at(&mut self, chunk: &Chunk<'_>, depth: u32, pre_scan: usize) {
        self.depth = depth;
        self.token_start = chunk.offset;
        self.pos = chunk.offset + pre_scan;
        self.lexed_lines += 1;
    }

    fn scan_comment(&mut self, chunk: &Chunk<'_>) -> Option<Token<Kind>> {
        let stop = chunk.stop();
        while self.pos < stop {
            let here = chunk.get(self.pos);
            let next = chunk.get(self.pos + 1);
            match (here, next) {
                (Some('/'), Some('*')) => {
                    self.depth += 1;
                    self.pos += 2;
                }
                (Some('*'), Some('/')) => {
                    self.depth -= 1;
                    self.pos += 2;
                    if self.depth == 0 {
                        return Some(self.emit(Kind::Comment));
                    }
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(stop);
        // Still open: flush only if nothing follows.
        (chunk.last_chunk && self.pos > self.token_start).then(|| self.emit(Kind::Comment))
    }

    fn emit(&mut self, kind: Kind) -> Token<Kind> {
        let token = Token::new(kind, self.token_start, self.pos - self.token_start);
        self.token_start = self.pos;
        token
    }
}

impl Lexer for NestedCommentLexer {
    type State = u32;
    type TokenKind = Kind;

    fn initial_state(&self) -> u32 {
        0
    }

    fn load(&mut self, resume: Option<Resume<'_, u32>>, chunk: &Chunk<'_>) {
        match resume {
            Some(resume) => self.resume_at(chunk, *resume.state, resume.pre_scan),
            None => self.resume_at(chunk, 0, 0),
        }
    }

    fn next_token(&mut self, chunk: &Chunk<'_>) -> Result<Option<Token<Kind>>, LexerError> {
        if self.depth > 0 {
            return Ok(self.scan_comment(chunk));
        }
        let stop = chunk.stop();
        if self.pos >= stop {
            return Ok(None);
        }
        self.token_start = self.pos;
        match chunk.get(self.pos) {
            Some('\0') => Err(LexerError::new(self.pos, "NUL in source")),
            Some('/') if chunk.get(self.pos + 1) == Some('*') && self.pos + 1 < stop => {
                self.depth = 1;
                self.pos += 2;
                Ok(self.scan_comment(chunk))
            }
            Some(ch) if ch.is_alphanumeric() => {
                while self.pos < stop && chunk.get(self.pos).is_some_and(char::is_alphanumeric) {
                    self.pos += 1;
                }
                Ok(Some(self.emit(Kind::Word)))
            }
            _ => {
                self.pos += 1;
                Ok(Some(self.emit(Kind::Other)))
            }
        }
    }

    fn relocate(&mut self, chunk: &Chunk<'_>) {
        let pre_scan = self.pre_scan_length();
        self.resume_at(chunk, self.depth, pre_scan);
    }

    fn current_state(&self) -> u32 {
        self.depth
    }

    fn compare_state(&self, other: &u32) -> StateComparison {
        if self.depth == *other {
            StateComparison::Equal
        } else {
            StateComparison::NotEqual
        }
    }

    fn pre_scan_length(&self) -> usize {
        if self.depth > 0 {
            self.pos - self.token_start
        } else {
            0
        }
    }
}

type CommentDocument = Document<NestedCommentLexer>;

fn new_doc(text: &str) -> CommentDocument {
    Document::new(text, NestedCommentLexer::default())
}

/// Independent scan: nesting depth and pre-scan at the start of every line.
fn scratch_states(text: &str) -> Vec<(u32, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut states = vec![(0, 0)];
    let mut depth = 0u32;
    let mut opened_at = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let pair = (chars[i], chars.get(i + 1).copied());
        match pair {
            ('/', Some('*')) => {
                if depth == 0 {
                    opened_at = i;
                }
                depth += 1;
                i += 2;
            }
            ('*', Some('/')) if depth > 0 => {
                depth -= 1;
                i += 2;
            }
            ('\n', _) => {
                i += 1;
                let pre_scan = if depth > 0 { i - opened_at } else { 0 };
                states.push((depth, pre_scan));
            }
            _ => i += 1,
        }
    }
    states
}

fn assert_matches_scratch(doc: &mut CommentDocument) {
    let expected = scratch_states(&doc.text());
    assert_eq!(expected.len(), doc.line_count());
    for (line, (depth, pre_scan)) in expected.into_iter().enumerate() {
        assert_eq!(doc.syntax_state_at(line).unwrap(), depth, "state of line {line}");
        assert_eq!(doc.line_record(line).unwrap().pre_scan, pre_scan, "pre-scan of line {line}");
    }
}

fn code_lines(count: usize) -> String {
    (0..count).map(|i| format!("let v{i} = w;\n")).collect()
}

#[test]
fn test_states_match_scratch_after_random_edits() {
    let mut doc = new_doc("alpha /* one\n two */ beta\n/* a /* b */ c\n*/ end\n");
    let mut rng = rand::thread_rng();
    let fragments = ["/*", "*/", "x", "\n", "ab\n", " ", "/* z */"];

    for round in 0..400 {
        let len = doc.len();
        if rng.gen_bool(0.6) || len == 0 {
            let text = fragments[rng.gen_range(0..fragments.len())];
            doc.insert(rng.gen_range(0..=len), text).unwrap();
        } else {
            let offset = rng.gen_range(0..len);
            let length = rng.gen_range(1..=6.min(len - offset));
            let mut tx = doc.remove(offset, length).unwrap();
            if rng.gen_bool(0.3) {
                tx.undo(&mut doc).unwrap();
            }
        }

        // Probe a few lines lazily; the rest stays unverified until the final sweep.
        let expected = scratch_states(&doc.text());
        for _ in 0..3 {
            let line = rng.gen_range(0..doc.line_count());
            assert_eq!(doc.syntax_state_at(line).unwrap(), expected[line].0, "round {round}");
        }
    }

    assert_matches_scratch(&mut doc);
}

#[test]
fn test_undo_redo_match_scratch_with_few_stale_segments() {
    let fragments = ["/*", "*/", "w", "\n", "x\ny", " ", "/* q */", "*/\n/*"];
    let mut rng = rand::thread_rng();

    for max_stale_segments in [0, 1, 2, 32] {
        for trial in 0..10 {
            let options = DocumentOptions::default().with_max_stale_segments(max_stale_segments);
            let mut text = code_lines(20);
            text.insert_str(40, "/* open\n");
            let mut doc = Document::with_options(&text, NestedCommentLexer::default(), options);
            let mut applied: Vec<EditTransaction<u32>> = Vec::new();
            let mut undone: Vec<EditTransaction<u32>> = Vec::new();

            for step in 0..150 {
                let len = doc.len();
                match rng.gen_range(0..10) {
                    0..=2 => {
                        if let Some(mut tx) = applied.pop() {
                            tx.undo(&mut doc).unwrap();
                            undone.push(tx);
                        }
                    }
                    3..=4 => {
                        if let Some(mut tx) = undone.pop() {
                            tx.redo(&mut doc).unwrap();
                            applied.push(tx);
                        }
                    }
                    5..=7 => {
                        let text = fragments[rng.gen_range(0..fragments.len())];
                        applied.push(doc.insert(rng.gen_range(0..=len), text).unwrap());
                        undone.clear();
                    }
                    _ if len > 0 => {
                        let offset = rng.gen_range(0..len);
                        let length = rng.gen_range(1..=20.min(len - offset));
                        applied.push(doc.remove(offset, length).unwrap());
                        undone.clear();
                    }
                    _ => {}
                }

                let expected = scratch_states(&doc.text());
                for _ in 0..2 {
                    let line = rng.gen_range(0..doc.line_count());
                    assert_eq!(
                        doc.syntax_state_at(line).unwrap(),
                        expected[line].0,
                        "cap {max_stale_segments}, trial {trial}, step {step}, line {line}"
                    );
                }
            }

            assert_matches_scratch(&mut doc);
        }
    }
}

#[test]
fn test_edit_inside_comment_reconverges_after_comment_end() {
    let mut text = code_lines(10);
    text.push_str("/*\n");
    text.push_str(&code_lines(10));
    text.push_str("*/\n");
    text.push_str(&code_lines(500));
    let mut doc = new_doc(&text);
    let last = doc.line_count() - 1;
    assert_eq!(doc.syntax_state_at(last).unwrap(), 0);

    // Inside the comment: the pre-scan of lines 16..=21 grows, the tail after `*/` is untouched.
    let offset = doc.line_start(15).unwrap();
    doc.insert(offset, "more words ").unwrap();

    let before = doc.lexer().lexed_lines;
    assert_eq!(doc.syntax_state_at(last).unwrap(), 0);
    assert_eq!(doc.lexer().lexed_lines - before, 7);
    assert_eq!(doc.syntax_cache().frontier(), last + 1);
    assert_matches_scratch(&mut doc);
}

#[test]
fn test_unterminated_comment_relexes_tail() {
    let mut doc = new_doc(&code_lines(50));
    let last = doc.line_count() - 1;
    doc.syntax_state_at(last).unwrap();

    let offset = doc.line_start(5).unwrap();
    let mut tx = doc.insert(offset, "/*").unwrap();
    let before = doc.lexer().lexed_lines;
    assert_eq!(doc.syntax_state_at(last).unwrap(), 1);
    assert!(doc.lexer().lexed_lines - before >= last - 5);
    assert_eq!(doc.line_record(last).unwrap().pre_scan, doc.len() - offset);

    tx.undo(&mut doc).unwrap();
    assert_eq!(doc.syntax_state_at(last).unwrap(), 0);
    assert_matches_scratch(&mut doc);
}

#[test]
fn test_undo_of_large_removal_keeps_cached_states() {
    let mut text = code_lines(100);
    text.push_str("/* open\n");
    text.push_str(&code_lines(700));
    text.push_str("close */\n");
    text.push_str(&code_lines(100));
    let mut doc = new_doc(&text);
    let last = doc.line_count() - 1;
    doc.syntax_state_at(last).unwrap();

    let start = doc.line_start(50).unwrap();
    let end = doc.line_start(850).unwrap();
    let mut tx = doc.remove(start, end - start).unwrap();
    assert_eq!(doc.line_count(), last + 1 - 800);

    tx.undo(&mut doc).unwrap();
    assert_eq!(doc.line_count(), last + 1);
    let before = doc.lexer().lexed_lines;
    doc.syntax_state_at(last).unwrap();
    assert!(
        doc.lexer().lexed_lines - before <= 3,
        "re-lexed {} lines",
        doc.lexer().lexed_lines - before
    );
    assert_matches_scratch(&mut doc);
}

#[test]
fn test_lexer_failure_propagates_and_retry_succeeds() {
    let mut doc = new_doc(&code_lines(20));
    let offset = doc.line_start(3).unwrap();
    let mut tx = doc.insert(offset, "\0").unwrap();

    let err = doc.syntax_state_at(10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lexer);
    // Lines before the failure are verified, the rest is still "not computed".
    assert_eq!(doc.line_record(3).unwrap().state, Some(0));
    assert_eq!(doc.line_record(4).unwrap().state, None);

    tx.undo(&mut doc).unwrap();
    assert_eq!(doc.syntax_state_at(10).unwrap(), 0);
    assert_matches_scratch(&mut doc);
}

#[test]
fn test_line_tokens_are_clipped_to_the_line() {
    let mut doc = new_doc("a /* b\nc */ d\n");
    let tokens = doc.line_tokens(1).unwrap();
    let spans: Vec<(Kind, usize, usize)> = tokens
        .iter()
        .map(|token| (token.kind, token.start, token.len))
        .collect();
    assert_eq!(
        spans,
        vec![
            (Kind::Comment, 7, 4),
            (Kind::Other, 11, 1),
            (Kind::Word, 12, 1),
            (Kind::Other, 13, 1),
        ]
    );
    assert_eq!(doc.line_record(1).unwrap().pre_scan, 5);
}

#[test]
fn test_invalid_line_is_a_bounds_error() {
    let mut doc = new_doc("one\ntwo");
    assert_eq!(doc.syntax_state_at(2).unwrap_err().kind(), ErrorKind::Bounds);
    assert_eq!(doc.line_tokens(5).unwrap_err().kind(), ErrorKind::Bounds);
}
