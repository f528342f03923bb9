//! Offset <-> line/column conversion.
//!
//! Trees and problems store byte offsets. Problems additionally carry a
//! 1-based line and column, computed once through a `LineMap`.

use serde::{Deserialize, Serialize};

/// A 0-indexed line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// Line map for offset <-> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    /// Starting offset of each line (line_starts[0] is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text. `\n`, `\r\n` and lone `\r` all end a line.
    pub fn build(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        let bytes = source.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            } else if b == b'\r' && bytes.get(i + 1) != Some(&b'\n') {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    fn line_index(&self, offset: u32) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        }
    }

    /// 1-based line number of `offset`.
    pub fn line_number(&self, offset: u32) -> u32 {
        self.line_index(offset) as u32 + 1
    }

    /// 1-based column of `offset`, counted in characters.
    pub fn column_number(&self, offset: u32, source: &str) -> u32 {
        self.offset_to_position(offset, source).character + 1
    }

    /// Convert a byte offset to a 0-indexed position.
    pub fn offset_to_position(&self, offset: u32, source: &str) -> Position {
        let line = self.line_index(offset);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let clamped_end = (offset as usize).min(source.len());
        let start = (line_start as usize).min(clamped_end);
        let character = source
            .get(start..clamped_end)
            .map(|slice| slice.chars().count() as u32)
            .unwrap_or(0);
        Position {
            line: line as u32,
            character,
        }
    }

    /// Convert a 0-indexed position back to a byte offset.
    pub fn position_to_offset(&self, position: Position, source: &str) -> Option<u32> {
        let line_start = *self.line_starts.get(position.line as usize)?;
        let rest = source.get(line_start as usize..)?;
        let mut offset = line_start;
        for (count, ch) in rest.chars().enumerate() {
            if count as u32 == position.character || ch == '\n' || ch == '\r' {
                break;
            }
            offset += ch.len_utf8() as u32;
        }
        Some(offset)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_start(&self, line: usize) -> Option<u32> {
        self.line_starts.get(line).copied()
    }
}

#[cfg(test)]
mod position_tests {
    use super::*;

    #[test]
    fn test_line_numbers_are_one_based() {
        let source = "class A {\n  int x;\n}";
        let map = LineMap::build(source);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.line_number(0), 1);
        assert_eq!(map.line_number(12), 2);
        assert_eq!(map.column_number(12, source), 3);
    }

    #[test]
    fn test_windows_line_endings() {
        let source = "a\r\nb\rc";
        let map = LineMap::build(source);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.offset_to_position(3, source), Position::new(1, 0));
        assert_eq!(map.offset_to_position(5, source), Position::new(2, 0));
    }

    #[test]
    fn test_position_roundtrip() {
        let source = "package p;\nclass A {}\n";
        let map = LineMap::build(source);
        for offset in 0..source.len() as u32 {
            let pos = map.offset_to_position(offset, source);
            assert_eq!(map.position_to_offset(pos, source), Some(offset));
        }
    }
}
