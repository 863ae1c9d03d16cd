use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A line comment mentioning `default` on the same line, after the node.
    static ref DEFAULT_COMMENT: Regex =
        Regex::new(r"^[^\n\r\u{2028}\u{2029}]*?//[^\n\r\u{2028}\u{2029}]*\bdefault\b")
            .expect("default comment regex");
}

const RESERVED_WORDS: &[&str] = &[
    "arguments",
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

/// Mangles a module id into identifier-safe text: ASCII letters and digits
/// stay, path separators become `$`, `_` is doubled and anything else turns
/// into `_`.
pub fn path_to_name(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        match ch {
            c if c.is_ascii_alphanumeric() => out.push(c),
            '/' | '\\' => out.push('$'),
            '_' => out.push_str("__"),
            _ => out.push('_'),
        }
    }
    out
}

/// Local name bound to a hoisted import of `id`.
pub fn import_binding_name(id: &str) -> String {
    format!("_require_{}_", path_to_name(id))
}

pub fn export_binding_name(name: &str) -> String {
    format!("_export_{name}_")
}

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Whether `source[pos..]` starts a line tail carrying a `// ... default`
/// comment.
pub fn has_default_comment(source: &str, pos: u32) -> bool {
    source.get(pos as usize..).is_some_and(|rest| DEFAULT_COMMENT.is_match(rest))
}
