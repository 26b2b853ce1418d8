//! Incremental newline matcher shared by the indexer and the validator, so
//! both agree on where lines end.
//!
//! Multi-byte terminators are matched with a partial-match cursor. A byte
//! that breaks a partial match resets the cursor and is not re-examined as
//! the start of a new terminator: with CRLF, `"\r\r\n"` contains no line
//! break.
#[derive(Debug, Clone)]
pub struct NewlineMatcher<'a> {
    newline: &'a [u8],
    matched: usize,
}

impl<'a> NewlineMatcher<'a> {
    pub fn new(newline: &'a [u8]) -> Self {
        assert!(!newline.is_empty(), "newline sequence cannot be empty");
        NewlineMatcher {
            newline,
            matched: 0,
        }
    }

    #[inline]
    pub fn newline_len(&self) -> usize {
        self.newline.len()
    }

    /// Scan the next chunk of the stream. `on_end` receives the position
    /// within `chunk` just past every completed terminator. Partial matches
    /// carry over between calls.
    pub fn scan<E>(
        &mut self,
        chunk: &[u8],
        mut on_end: impl FnMut(usize) -> Result<(), E>,
    ) -> Result<(), E> {
        if let &[nl] = self.newline {
            for pos in memchr::memchr_iter(nl, chunk) {
                on_end(pos + 1)?;
            }
            return Ok(());
        }
        for (pos, &b) in chunk.iter().enumerate() {
            if b == self.newline[self.matched] {
                self.matched += 1;
                if self.matched == self.newline.len() {
                    self.matched = 0;
                    on_end(pos + 1)?;
                }
            } else {
                self.matched = 0;
            }
        }
        Ok(())
    }
}
