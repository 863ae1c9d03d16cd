use serde::{Deserialize, Serialize};

/// A V3 source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// The trailing comment linking generated code to a map file next to it.
    pub fn url_comment(map_file_name: &str) -> String {
        format!("//# sourceMappingURL={map_file_name}")
    }
}

/// VLQ-encode a signed integer and append it to `out`.
fn vlq_encode(value: i64, out: &mut String) {
    const B64: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut v = (if value < 0 { ((-value) << 1) | 1 } else { value << 1 }) as u64;
    loop {
        let mut digit = (v & 0x1f) as u8;
        v >>= 5;
        if v > 0 {
            digit |= 0x20;
        }
        out.push(B64[digit as usize] as char);
        if v == 0 {
            break;
        }
    }
}

/// Tracks the generated position while the editor renders and records one
/// segment per mapped location.
pub(crate) struct SourceMapBuilder<'s> {
    source: &'s str,
    line_starts: Vec<u32>,
    gen_line: u32,
    gen_col: u32,
    /// (generated line, generated column, source line, source column)
    segments: Vec<(u32, u32, u32, u32)>,
}

impl<'s> SourceMapBuilder<'s> {
    pub(crate) fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source.bytes().enumerate().filter(|(_, b)| *b == b'\n').map(|(i, _)| i as u32 + 1),
        );
        Self { source, line_starts, gen_line: 0, gen_col: 0, segments: Vec::new() }
    }

    /// Moves the generated position past inserted text.
    pub(crate) fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.gen_line += 1;
                self.gen_col = 0;
            } else {
                self.gen_col += ch.len_utf16() as u32;
            }
        }
    }

    /// Maps the current generated position to `pos` in the source.
    pub(crate) fn add_mapping(&mut self, pos: u32) {
        let (line, col) = self.locate(pos);
        self.segments.push((self.gen_line, self.gen_col, line, col));
    }

    /// Emits an unedited source range, mapping its start and every line start
    /// inside it.
    pub(crate) fn add_original(&mut self, start: u32, end: u32) {
        if start == end {
            return;
        }
        self.add_mapping(start);
        let text = &self.source[start as usize..end as usize];
        for (offset, ch) in text.char_indices() {
            if ch == '\n' {
                self.gen_line += 1;
                self.gen_col = 0;
                let next = start + offset as u32 + 1;
                if next < end {
                    self.add_mapping(next);
                }
            } else {
                self.gen_col += ch.len_utf16() as u32;
            }
        }
    }

    fn locate(&self, pos: u32) -> (u32, u32) {
        let line = self.line_starts.partition_point(|start| *start <= pos) - 1;
        let line_start = self.line_starts[line] as usize;
        let col = self.source[line_start..pos as usize].encode_utf16().count();
        (line as u32, col as u32)
    }

    pub(crate) fn build(mut self, source_name: &str, include_content: bool) -> SourceMap {
        self.segments.sort_by_key(|s| (s.0, s.1));

        let mut mappings = String::new();
        let mut line = 0;
        let mut prev_gen_col: i64 = 0;
        let mut prev_src_line: i64 = 0;
        let mut prev_src_col: i64 = 0;
        let mut first_on_line = true;

        for &(gen_line, gen_col, src_line, src_col) in &self.segments {
            while line < gen_line {
                mappings.push(';');
                line += 1;
                prev_gen_col = 0;
                first_on_line = true;
            }
            if !first_on_line {
                mappings.push(',');
            }
            first_on_line = false;

            vlq_encode(i64::from(gen_col) - prev_gen_col, &mut mappings);
            // single source
            vlq_encode(0, &mut mappings);
            vlq_encode(i64::from(src_line) - prev_src_line, &mut mappings);
            vlq_encode(i64::from(src_col) - prev_src_col, &mut mappings);

            prev_gen_col = i64::from(gen_col);
            prev_src_line = i64::from(src_line);
            prev_src_col = i64::from(src_col);
        }

        SourceMap {
            version: 3,
            file: None,
            sources: vec![source_name.to_string()],
            sources_content: include_content.then(|| vec![self.source.to_string()]),
            names: Vec::new(),
            mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vlq_encode() {
        let mut out = String::new();
        for value in [0, 1, -1, 15, 16, -16, 1000] {
            vlq_encode(value, &mut out);
            out.push(' ');
        }
        assert_eq!(out, "A C D e gB hB w+B ");
    }

    #[test]
    fn test_identity_map() {
        let source = "a;\nb;\n";
        let mut builder = SourceMapBuilder::new(source);
        builder.add_original(0, source.len() as u32);
        let map = builder.build("a.js", true);
        assert_eq!(map.mappings, "AAAA;AACA");
        assert_eq!(map.sources_content, Some(vec![source.to_string()]));
    }

    #[test]
    fn test_inserted_lines_shift_mappings() {
        let source = "a;";
        let mut builder = SourceMapBuilder::new(source);
        builder.advance("import x from \"x\";\n");
        builder.add_original(0, 2);
        let map = builder.build("a.js", false);
        assert_eq!(map.mappings, ";AAAA");
    }

    #[test]
    fn test_json_shape() {
        let map = SourceMap {
            version: 3,
            file: None,
            sources: vec!["a.js".to_string()],
            sources_content: None,
            names: Vec::new(),
            mappings: "AAAA".to_string(),
        };
        assert_eq!(
            map.to_json().unwrap(),
            r#"{"version":3,"sources":["a.js"],"names":[],"mappings":"AAAA"}"#
        );
        assert_eq!(SourceMap::url_comment("a.js.map"), "//# sourceMappingURL=a.js.map");
    }
}
