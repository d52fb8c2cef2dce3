//! Offset bookkeeping for text that has been lifted out of the source.
//!
//! Block parsing strips container prefixes and line endings before inline
//! parsing ever sees the text, so inline offsets are offsets into a rebuilt
//! string. A [`PositionMap`] records, for every segment appended to that
//! string, where the segment came from in the original input; inline spans
//! are translated back through it.

/// Translates offsets in an accumulated content string back to byte offsets
/// in the original source.
///
/// Anchors are `(content_offset, source_offset)` pairs, one per appended
/// segment, strictly ascending in both components. Between anchors the
/// mapping is linear.
#[derive(Debug, Default, Clone)]
pub struct PositionMap {
    anchors: Vec<(usize, usize)>,
}

impl PositionMap {
    pub fn new() -> Self {
        PositionMap { anchors: vec![] }
    }

    /// Records that the content at `content_offset` onwards was copied from
    /// `source_offset` onwards.
    pub fn push_anchor(&mut self, content_offset: usize, source_offset: usize) {
        if let Some(&(last, _)) = self.anchors.last() {
            assert!(content_offset >= last);
            if content_offset == last {
                // Re-anchoring the same point; the newer segment wins.
                self.anchors.pop();
            }
        }
        self.anchors.push((content_offset, source_offset));
    }

    /// Maps a content offset to the source offset it was copied from.
    ///
    /// Offsets past the final anchored segment extrapolate linearly, which
    /// keeps end-exclusive span arithmetic simple for the caller.
    pub fn source(&self, content_offset: usize) -> usize {
        let ix = match self
            .anchors
            .binary_search_by(|probe| probe.0.cmp(&content_offset))
        {
            Ok(ix) => ix,
            Err(0) => return content_offset,
            Err(ix) => ix - 1,
        };
        let (content, source) = self.anchors[ix];
        source + (content_offset - content)
    }

    /// Drops the first `consumed` bytes of content from the map, shifting
    /// the remaining anchors down. Used when a leading portion of a leaf's
    /// content is claimed by another construct.
    pub fn advance(&mut self, consumed: usize) {
        if consumed == 0 {
            return;
        }
        let resumed_source = self.source(consumed);
        self.anchors.retain(|&(content, _)| content > consumed);
        for anchor in &mut self.anchors {
            anchor.0 -= consumed;
        }
        if self.anchors.first().map_or(true, |&(content, _)| content > 0) {
            self.anchors.insert(0, (0, resumed_source));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// A 1-based line/column position. Columns count bytes, not characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

/// Resolves byte offsets to 1-based line/column pairs.
///
/// Built once from the source when requested; spans themselves stay as
/// byte offsets.
#[derive(Debug, Clone)]
pub struct Locator {
    line_starts: Vec<usize>,
    len: usize,
}

impl Locator {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (ix, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(ix + 1);
            }
        }
        Locator {
            line_starts,
            len: source.len(),
        }
    }

    /// Locates `offset`, which must not exceed the source length.
    pub fn locate(&self, offset: usize) -> LineColumn {
        assert!(offset <= self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(ix) => ix,
            Err(ix) => ix - 1,
        };
        LineColumn {
            line: line + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_identity_without_anchors() {
        let map = PositionMap::new();
        assert_eq!(map.source(17), 17);
    }

    #[test]
    fn map_translates_per_segment() {
        let mut map = PositionMap::new();
        // "> foo\n> bar\n" accumulated as "foo\nbar\n".
        map.push_anchor(0, 2);
        map.push_anchor(4, 8);
        assert_eq!(map.source(0), 2);
        assert_eq!(map.source(3), 5);
        assert_eq!(map.source(4), 8);
        assert_eq!(map.source(7), 11);
    }

    #[test]
    fn map_advance_shifts_anchors() {
        let mut map = PositionMap::new();
        map.push_anchor(0, 10);
        map.push_anchor(6, 20);
        map.advance(3);
        assert_eq!(map.source(0), 13);
        assert_eq!(map.source(3), 20);
    }

    #[test]
    fn locator_lines_and_columns() {
        let locator = Locator::new("ab\ncdef\n\nx");
        assert_eq!(locator.locate(0), LineColumn { line: 1, column: 1 });
        assert_eq!(locator.locate(2), LineColumn { line: 1, column: 3 });
        assert_eq!(locator.locate(3), LineColumn { line: 2, column: 1 });
        assert_eq!(locator.locate(8), LineColumn { line: 3, column: 1 });
        assert_eq!(locator.locate(9), LineColumn { line: 4, column: 1 });
    }
}
