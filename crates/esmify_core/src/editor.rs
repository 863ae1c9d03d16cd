use log::trace;
use thiserror::Error;

use crate::sourcemap::{SourceMap, SourceMapBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("cannot split a chunk that has already been edited (at {pos})")]
    SplitEdited { pos: u32 },
    #[error("cannot overwrite a zero-length range (at {pos}), append instead")]
    EmptyRange { pos: u32 },
    #[error("range {start}..{end} is outside of the source")]
    OutOfBounds { start: u32, end: u32 },
}

impl EditError {
    pub fn pos(&self) -> u32 {
        match self {
            EditError::SplitEdited { pos } | EditError::EmptyRange { pos } => *pos,
            EditError::OutOfBounds { start, .. } => *start,
        }
    }
}

#[derive(Debug, Clone)]
struct Chunk {
    start: u32,
    end: u32,
    intro: String,
    outro: String,
    /// Replacement text. `None` renders the original slice.
    content: Option<String>,
}

impl Chunk {
    fn original(start: u32, end: u32) -> Self {
        Self { start, end, intro: String::new(), outro: String::new(), content: None }
    }

    fn clear(&mut self) {
        self.intro.clear();
        self.outro.clear();
        self.content = Some(String::new());
    }
}

/// Accumulates edits over byte ranges of an immutable source and renders
/// them in one pass.
///
/// The source is kept as a sorted list of chunks. Every edit boundary splits a
/// chunk; text appended at a boundary attaches to the chunk on its left
/// (`append_left`) or on its right (`append_right`), so it survives or dies
/// together with that chunk when a later edit overwrites it.
#[derive(Debug, Clone)]
pub struct Editor<'s> {
    source: &'s str,
    chunks: Vec<Chunk>,
    intro: String,
    outro: String,
    changed: bool,
}

impl<'s> Editor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            chunks: vec![Chunk::original(0, source.len() as u32)],
            intro: String::new(),
            outro: String::new(),
            changed: false,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn slice(&self, start: u32, end: u32) -> &'s str {
        &self.source[start as usize..end as usize]
    }

    /// Whether any edit with a visible effect has been recorded.
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    pub fn append_left(&mut self, pos: u32, text: &str) -> Result<(), EditError> {
        self.check_bounds(pos, pos)?;
        self.split(pos)?;
        trace!("append_left {} {:?}", pos, text);
        match self.by_end(pos) {
            Some(idx) => self.chunks[idx].outro.push_str(text),
            None => self.intro.push_str(text),
        }
        self.changed |= !text.is_empty();
        Ok(())
    }

    pub fn append_right(&mut self, pos: u32, text: &str) -> Result<(), EditError> {
        self.check_bounds(pos, pos)?;
        self.split(pos)?;
        trace!("append_right {} {:?}", pos, text);
        match self.by_start(pos) {
            Some(idx) => self.chunks[idx].intro.push_str(text),
            None => self.outro.push_str(text),
        }
        self.changed |= !text.is_empty();
        Ok(())
    }

    /// Replaces `start..end` with `text`.
    ///
    /// With `content_only` the text appended at the edges of the first chunk is
    /// preserved; chunks after the first are always cleared.
    pub fn overwrite(
        &mut self,
        start: u32,
        end: u32,
        text: &str,
        content_only: bool,
    ) -> Result<(), EditError> {
        if start >= end {
            return Err(EditError::EmptyRange { pos: start });
        }
        self.check_bounds(start, end)?;
        self.split(start)?;
        self.split(end)?;
        trace!("overwrite {}..{} {:?} (content_only: {})", start, end, text, content_only);

        let (first, last) = self.range_indices(start, end);
        for chunk in &mut self.chunks[first + 1..=last] {
            chunk.clear();
        }
        let chunk = &mut self.chunks[first];
        chunk.content = Some(text.to_string());
        if !content_only {
            chunk.intro.clear();
            chunk.outro.clear();
        }
        self.changed = true;
        Ok(())
    }

    /// Overwrites a range, degrading to `append_left` when the range is empty.
    pub fn safe_overwrite(&mut self, start: u32, end: u32, text: &str) -> Result<(), EditError> {
        if start == end {
            return self.append_left(start, text);
        }
        self.overwrite(start, end, text, false)
    }

    pub fn remove(&mut self, start: u32, end: u32) -> Result<(), EditError> {
        if start == end {
            return Ok(());
        }
        self.check_bounds(start, end)?;
        self.split(start)?;
        self.split(end)?;
        trace!("remove {}..{}", start, end);

        let (first, last) = self.range_indices(start, end);
        for chunk in &mut self.chunks[first..=last] {
            chunk.clear();
        }
        self.changed = true;
        Ok(())
    }

    /// Renders the edited text together with a V3 source map pointing back
    /// into the original source.
    pub fn generate_map(&self, source_name: &str, include_content: bool) -> SourceMap {
        let mut builder = SourceMapBuilder::new(self.source);
        builder.advance(&self.intro);
        for chunk in &self.chunks {
            builder.advance(&chunk.intro);
            match &chunk.content {
                Some(content) => {
                    if !content.is_empty() {
                        builder.add_mapping(chunk.start);
                    }
                    builder.advance(content);
                }
                None => builder.add_original(chunk.start, chunk.end),
            }
            builder.advance(&chunk.outro);
        }
        builder.build(source_name, include_content)
    }

    fn check_bounds(&self, start: u32, end: u32) -> Result<(), EditError> {
        if start > end || end as usize > self.source.len() {
            return Err(EditError::OutOfBounds { start, end });
        }
        Ok(())
    }

    fn split(&mut self, pos: u32) -> Result<(), EditError> {
        let idx = self.chunks.partition_point(|c| c.end <= pos);
        let Some(chunk) = self.chunks.get_mut(idx) else {
            return Ok(());
        };
        if chunk.start >= pos {
            return Ok(());
        }
        if chunk.content.is_some() {
            return Err(EditError::SplitEdited { pos });
        }
        let mut tail = Chunk::original(pos, chunk.end);
        tail.outro = std::mem::take(&mut chunk.outro);
        chunk.end = pos;
        self.chunks.insert(idx + 1, tail);
        Ok(())
    }

    fn by_start(&self, pos: u32) -> Option<usize> {
        let idx = self.chunks.partition_point(|c| c.start < pos);
        self.chunks.get(idx).filter(|c| c.start == pos).map(|_| idx)
    }

    fn by_end(&self, pos: u32) -> Option<usize> {
        let idx = self.chunks.partition_point(|c| c.end < pos);
        self.chunks.get(idx).filter(|c| c.end == pos).map(|_| idx)
    }

    /// Indices of the first and last chunk covering an already split range.
    fn range_indices(&self, start: u32, end: u32) -> (usize, usize) {
        let first = self.chunks.partition_point(|c| c.start < start);
        let last = self.chunks.partition_point(|c| c.end < end);
        (first, last)
    }
}

impl std::fmt::Display for Editor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.intro)?;
        for chunk in &self.chunks {
            f.write_str(&chunk.intro)?;
            match &chunk.content {
                Some(content) => f.write_str(content)?,
                None => f.write_str(&self.source[chunk.start as usize..chunk.end as usize])?,
            }
            f.write_str(&chunk.outro)?;
        }
        f.write_str(&self.outro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_untouched() {
        let editor = Editor::new("const a = 1;");
        assert!(!editor.has_changed());
        assert_eq!(editor.to_string(), "const a = 1;");
    }

    #[test]
    fn test_overwrite_and_remove() {
        let mut editor = Editor::new("abcdef");
        editor.overwrite(1, 3, "X", false).unwrap();
        editor.remove(4, 5).unwrap();
        assert!(editor.has_changed());
        assert_eq!(editor.to_string(), "aXdf");
    }

    #[test]
    fn test_append_sides() {
        let mut editor = Editor::new("abc");
        editor.append_left(1, "<").unwrap();
        editor.append_right(1, ">").unwrap();
        assert_eq!(editor.to_string(), "a<>bc");

        editor.append_left(0, "^").unwrap();
        editor.append_right(3, "$").unwrap();
        assert_eq!(editor.to_string(), "^a<>bc$");
    }

    #[test]
    fn test_overwrite_clears_edges() {
        let mut editor = Editor::new("abc");
        editor.append_left(1, "<").unwrap();
        editor.append_right(1, ">").unwrap();
        editor.append_left(2, "!").unwrap();
        editor.overwrite(1, 2, "B", false).unwrap();
        assert_eq!(editor.to_string(), "a<Bc");
    }

    #[test]
    fn test_overwrite_content_only_keeps_edges() {
        let mut editor = Editor::new("abc");
        editor.append_right(1, ">").unwrap();
        editor.append_left(2, "!").unwrap();
        editor.overwrite(1, 2, "B", true).unwrap();
        assert_eq!(editor.to_string(), "a>B!c");
    }

    #[test]
    fn test_overwrite_spanning_chunks() {
        let mut editor = Editor::new("abcdef");
        editor.append_left(3, "|").unwrap();
        editor.overwrite(1, 5, "X", true).unwrap();
        assert_eq!(editor.to_string(), "aX|f");

        editor.overwrite(1, 5, "Y", false).unwrap();
        assert_eq!(editor.to_string(), "aYf");
    }

    #[test]
    fn test_append_after_overwrite_attaches_to_edited_chunk() {
        let mut editor = Editor::new("abcdef");
        editor.overwrite(2, 4, "X", false).unwrap();
        editor.append_left(4, ")").unwrap();
        editor.append_right(2, "(").unwrap();
        assert_eq!(editor.to_string(), "ab(X)ef");
    }

    #[test]
    fn test_split_edited_chunk_fails() {
        let mut editor = Editor::new("abcdef");
        editor.overwrite(0, 4, "X", false).unwrap();
        assert_eq!(editor.append_left(2, "!"), Err(EditError::SplitEdited { pos: 2 }));
    }

    #[test]
    fn test_empty_ranges() {
        let mut editor = Editor::new("abc");
        assert_eq!(editor.overwrite(1, 1, "X", false), Err(EditError::EmptyRange { pos: 1 }));
        editor.remove(2, 2).unwrap();
        assert!(!editor.has_changed());
        editor.safe_overwrite(1, 1, "X").unwrap();
        assert_eq!(editor.to_string(), "aXbc");
    }

    #[test]
    fn test_out_of_bounds() {
        let mut editor = Editor::new("abc");
        assert_eq!(editor.remove(1, 9), Err(EditError::OutOfBounds { start: 1, end: 9 }));
    }

    #[test]
    fn test_empty_source() {
        let mut editor = Editor::new("");
        editor.append_left(0, "a").unwrap();
        assert!(editor.has_changed());
        assert_eq!(editor.to_string(), "a");
    }

    #[test]
    fn test_generate_map() {
        let mut editor = Editor::new("a\nb");
        editor.overwrite(0, 1, "xy", false).unwrap();
        assert_eq!(editor.to_string(), "xy\nb");
        let map = editor.generate_map("input.js", false);
        assert_eq!(map.sources, vec!["input.js".to_string()]);
        assert_eq!(map.mappings, "AAAA,EAAC;AACD");
    }
}
