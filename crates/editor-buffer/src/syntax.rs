//! Incremental per-line lexer state cache.
//!
//! Lexer state is a left-to-right fold over the text, so an edit on line `L` can only change the
//! states of lines after `L`. The cache keeps two kinds of knowledge:
//!
//! - a **frontier**: every line below it holds a state verified against the current text;
//! - **stale segments**: runs of lines at or after the frontier whose old states are still
//!   consistent with each other, but not yet with what precedes them.
//!
//! Nothing is re-lexed on edit. When a state is requested, lexing resumes at the last verified
//! line and walks forward. After each line the fresh state is compared with the stale candidate
//! of the next line; if the lexer reports them equal, the whole segment is valid again and the
//! frontier jumps to its end. Editing inside a comment therefore only re-lexes up to the point
//! where the comment boundary reconverges with the untouched tail.

use crate::error::{BufferError, LexerError, Result};
use crate::lexer::{Chunk, Lexer, Resume, StateComparison, Token};
use crate::line_index::LineIndex;
use crate::storage::GapBuffer;
use std::ops::Range;

/// Default number of stale segments kept as early-exit candidates.
pub const DEFAULT_MAX_STALE_SEGMENTS: usize = 32;

/// Lexer state cache for one document.
#[derive(Debug)]
pub struct SyntaxStateCache<L: Lexer> {
    lexer: L,
    /// Lines `< frontier` hold verified states. Line 0 is always verified.
    frontier: usize,
    /// Disjoint, sorted, all at or after `frontier`.
    stale: Vec<Range<usize>>,
    max_stale_segments: usize,
    scratch: Vec<char>,
}

impl<L: Lexer> SyntaxStateCache<L> {
    /// Create a cache around `lexer`; nothing is lexed yet.
    pub fn new(lexer: L, max_stale_segments: usize) -> Self {
        Self {
            lexer,
            frontier: 1,
            stale: Vec::new(),
            max_stale_segments,
            scratch: Vec::new(),
        }
    }

    /// The wrapped lexer.
    pub fn lexer(&self) -> &L {
        &self.lexer
    }

    /// First line whose state is not verified.
    pub fn frontier(&self) -> usize {
        self.frontier
    }

    /// Current early-exit candidate segments.
    pub fn stale_segments(&self) -> &[Range<usize>] {
        &self.stale
    }

    /// Returns `true` if the state of `line` is known without lexing.
    pub fn is_valid(&self, line: usize) -> bool {
        line < self.frontier
    }

    /// Record a text edit.
    ///
    /// The edit touched line `line` (kept), removed the `removed` records after it and then
    /// inserted `inserted` records after it. `restored` lists runs (relative to `line + 1`) of
    /// inserted records that came back verbatim and are consistent among themselves.
    ///
    /// Returns the consistent runs among the removed records, relative to `line + 1`, so the
    /// removal can later be undone without losing them.
    pub fn on_edit(
        &mut self,
        line: usize,
        removed: usize,
        inserted: usize,
        restored: &[Range<usize>],
    ) -> Vec<Range<usize>> {
        let first = line + 1;
        let last_removed = line + removed;
        let delta = inserted as isize - removed as isize;
        let shift = |at: usize| (at as isize + delta) as usize;
        let old_frontier = self.frontier;

        let mut removed_runs = Vec::new();
        if removed > 0 {
            let valid_end = old_frontier.min(last_removed + 1);
            if first < valid_end {
                removed_runs.push(0..valid_end - first);
            }
            for segment in &self.stale {
                let start = segment.start.max(first);
                let end = segment.end.min(last_removed + 1);
                if start < end {
                    removed_runs.push(start - first..end - first);
                }
            }
        }

        let mut segments = Vec::with_capacity(self.stale.len() + 2);
        for segment in self.stale.drain(..) {
            if segment.start < first {
                segments.push(segment.start..segment.end.min(first));
            }
            let tail = segment.start.max(last_removed + 1);
            if tail < segment.end {
                segments.push(shift(tail)..shift(segment.end));
            }
        }
        if old_frontier > last_removed + 1 {
            segments.push(shift(last_removed + 1)..shift(old_frontier));
        }
        for run in restored {
            if run.start < run.end && run.end <= inserted {
                segments.push(first + run.start..first + run.end);
            }
        }

        segments.sort_by_key(|segment| segment.start);
        segments.truncate(self.max_stale_segments);
        self.stale = segments;
        self.frontier = old_frontier.min(first);

        tracing::trace!(
            line,
            removed,
            inserted,
            frontier = self.frontier,
            segments = self.stale.len(),
            "syntax cache invalidated"
        );
        removed_runs
    }

    /// Make the state of `target` valid, re-lexing from the frontier as needed.
    pub fn ensure_valid(
        &mut self,
        target: usize,
        lines: &mut LineIndex<L::State>,
        storage: &GapBuffer,
    ) -> Result<()> {
        if target >= lines.line_count() {
            return Err(BufferError::InvalidLine {
                line: target,
                line_count: lines.line_count(),
            });
        }

        let mut loaded = false;
        while self.frontier <= target {
            let line = self.frontier - 1;
            let next = self.frontier;
            if next >= lines.line_count() {
                return Err(BufferError::illegal(format!(
                    "syntax repair reached line {next} beyond line count {}",
                    lines.line_count()
                )));
            }

            self.lex_line(line, !loaded, lines, storage)?;
            loaded = true;

            let pre_scan = self.lexer.pre_scan_length();
            let converged = match self.stale.first() {
                Some(segment) if segment.start == next => {
                    let candidate = lines.state(next);
                    candidate.is_some_and(|state| {
                        self.lexer.compare_state(state) == StateComparison::Equal
                    }) && lines.pre_scan(next) == pre_scan
                }
                _ => false,
            };

            if converged {
                let segment = self.stale.remove(0);
                tracing::trace!(line = next, end = segment.end, "syntax state reconverged");
                self.frontier = segment.end;
                // The lexer sits at `next`; the jump invalidates its position.
                loaded = false;
            } else {
                lines.set_state(next, Some(self.lexer.current_state()), pre_scan);
                self.frontier = next + 1;
            }
            self.trim_stale();
        }
        Ok(())
    }

    fn trim_stale(&mut self) {
        let frontier = self.frontier;
        self.stale.retain_mut(|segment| {
            segment.start = segment.start.max(frontier);
            segment.start < segment.end
        });
    }

    /// Feed one line to the lexer and drain its tokens.
    fn lex_line(
        &mut self,
        line: usize,
        from_cache: bool,
        lines: &LineIndex<L::State>,
        storage: &GapBuffer,
    ) -> Result<()> {
        let pre_scan = if from_cache {
            lines.pre_scan(line)
        } else {
            self.lexer.pre_scan_length()
        };
        let last_chunk = line + 1 == lines.line_count();
        self.read_line(line, pre_scan, lines, storage)?;

        let chunk = Chunk {
            text: &self.scratch,
            offset: 0,
            len: self.scratch.len(),
            last_chunk,
            stop_offset: self.scratch.len(),
        };
        if from_cache {
            let resume = if line == 0 {
                None
            } else {
                let state = lines.state(line).ok_or_else(|| {
                    BufferError::illegal(format!("verified line {line} has no cached state"))
                })?;
                Some(Resume { state, pre_scan })
            };
            self.lexer.load(resume, &chunk);
        } else {
            self.lexer.relocate(&chunk);
        }
        drain(&mut self.lexer, &chunk)
    }

    /// Copy `line` plus `pre_scan` characters of context into the scratch buffer.
    ///
    /// Returns the document offset the scratch buffer starts at.
    fn read_line(
        &mut self,
        line: usize,
        pre_scan: usize,
        lines: &LineIndex<L::State>,
        storage: &GapBuffer,
    ) -> Result<usize> {
        let start = lines.line_start(line)?;
        // Every line is lexed with its terminator; the last one gets the implied break.
        let end = if line + 1 < lines.line_count() {
            lines.line_start(line + 1)?
        } else {
            storage.len()
        };
        let from = start.checked_sub(pre_scan).ok_or_else(|| {
            BufferError::illegal(format!(
                "pre-scan of {pre_scan} reaches before the start of the document at line {line}"
            ))
        })?;
        storage.read_into(from, end - from, &mut self.scratch)?;
        Ok(from)
    }

    /// Tokens of `line` in document offsets, clipped to `clip`.
    ///
    /// The state of `line` must be valid (see [`SyntaxStateCache::ensure_valid`]).
    pub fn line_tokens(
        &mut self,
        line: usize,
        clip: Range<usize>,
        lines: &LineIndex<L::State>,
        storage: &GapBuffer,
    ) -> Result<Vec<Token<L::TokenKind>>> {
        if !self.is_valid(line) {
            return Err(BufferError::illegal(format!(
                "tokens requested for line {line} before its state was repaired"
            )));
        }
        let pre_scan = lines.pre_scan(line);
        let from = self.read_line(line, pre_scan, lines, storage)?;

        let chunk = Chunk::new(&self.scratch);
        let resume = if line == 0 {
            None
        } else {
            let state = lines.state(line).ok_or_else(|| {
                BufferError::illegal(format!("verified line {line} has no cached state"))
            })?;
            Some(Resume { state, pre_scan })
        };
        self.lexer.load(resume, &chunk);

        let mut tokens = Vec::new();
        let mut budget = chunk.len + 1;
        while let Some(token) = self.lexer.next_token(&chunk)? {
            budget = budget
                .checked_sub(1)
                .ok_or_else(|| LexerError::new(token.start, "lexer made no progress"))?;
            let start = (from + token.start).max(clip.start);
            let end = (from + token.end()).min(clip.end);
            if start < end {
                tokens.push(Token::new(token.kind, start, end - start));
            }
        }
        Ok(tokens)
    }
}

fn drain<L: Lexer>(lexer: &mut L, chunk: &Chunk<'_>) -> Result<()> {
    // A well-behaved lexer yields at most one token per character plus a final flush.
    let mut budget = chunk.len + 1;
    while let Some(token) = lexer.next_token(chunk)? {
        if token.end() > chunk.end() {
            return Err(LexerError::new(token.start, "token extends past the chunk").into());
        }
        budget = budget
            .checked_sub(1)
            .ok_or_else(|| LexerError::new(token.start, "lexer made no progress"))?;
    }
    Ok(())
}
