use oxc_span::Span;

/// A `require(<string>)` call that will be rewritten into an import.
#[derive(Debug)]
pub struct RequireSite<'a> {
    /// The module id, i.e. the value of the string argument.
    pub id: &'a str,
    /// The whole `require(...)` call.
    pub call: Span,
    /// The string literal argument, quotes included.
    pub arg: Span,
    /// The `require` callee.
    pub callee: Span,
    /// Start of the top-level statement holding the call.
    pub root: u32,
    pub kind: RequireKind<'a>,
    /// The call result is itself called, constructed, tagged or extended.
    pub callable: bool,
}

#[derive(Debug)]
pub enum RequireKind<'a> {
    /// The sole initializer of a top-level variable declarator.
    Declared(Declarator<'a>),
    /// `Promise.resolve(require("x"))`, spanning the outer call.
    Dynamic { span: Span },
    /// A top-level expression statement made of the call alone.
    Bare,
    /// Anywhere else.
    Inline,
}

#[derive(Debug)]
pub struct Declarator<'a> {
    pub binding: DeclaredBinding<'a>,
    /// The declarator node.
    pub node: Span,
    /// The binding side of the declarator.
    pub left: Span,
    /// The declaration holding the declarator.
    pub declaration: Span,
    /// `var`, `let` or `const`.
    pub kind: &'a str,
    /// The declarator's initializer.
    pub init: Span,
    pub prev: Option<Sibling>,
    pub next: Option<Sibling>,
}

#[derive(Debug, Clone, Copy)]
pub struct Sibling {
    pub span: Span,
    /// The sibling is itself a declared require.
    pub is_require: bool,
}

#[derive(Debug)]
pub enum DeclaredBinding<'a> {
    /// `const x = require("x")`
    Single { local: &'a str },
    /// `const x = require("x").prop`
    Property { local: &'a str, property: &'a str },
    /// `const {a, b: c} = require("x")`
    Destructured { pattern: Span, props: Vec<DestructuredProp<'a>> },
}

#[derive(Debug)]
pub struct DestructuredProp<'a> {
    pub key: &'a str,
    pub key_span: Span,
    /// The local binding. Equal to `key_span` for shorthand properties.
    pub value_span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportObject {
    Module,
    Exports,
}

impl ExportObject {
    pub fn name(self) -> &'static str {
        match self {
            ExportObject::Module => "module",
            ExportObject::Exports => "exports",
        }
    }
}

/// A reference to `module` or `exports`.
#[derive(Debug)]
pub struct ExportSite<'a> {
    pub object: ExportObject,
    /// The `module` or `exports` identifier itself.
    pub leftmost: Span,
    /// The `module.exports` part of a `module.exports[.name]` reference.
    pub module_exports: Option<Span>,
    pub root: u32,
    pub shape: ExportShape<'a>,
}

impl<'a> ExportSite<'a> {
    /// The exported name; `None` for the default export.
    pub fn name(&self) -> Option<&'a str> {
        match &self.shape {
            ExportShape::Assign { name, .. }
            | ExportShape::Declare { name, .. }
            | ExportShape::Nested { name, .. } => *name,
            ExportShape::Bare => None,
        }
    }

    pub fn is_bare(&self) -> bool {
        matches!(self.shape, ExportShape::Bare)
    }

    /// Assignments and declarations give the export its initial value.
    pub fn is_init(&self) -> bool {
        matches!(self.shape, ExportShape::Assign { .. } | ExportShape::Declare { .. })
    }
}

#[derive(Debug)]
pub enum ExportShape<'a> {
    /// A top-level `module.exports[.name] = value;` or `exports.name = value;`
    /// statement.
    Assign {
        name: Option<&'a str>,
        /// The assigned member expression.
        left: Span,
        value: ExportValue<'a>,
        statement: Span,
        /// The value is itself an assignment to `module` or `exports`.
        chained: bool,
    },
    /// `const id = module.exports[.name] = value;` at the top level.
    Declare {
        name: Option<&'a str>,
        id: &'a str,
        id_span: Span,
        kind: &'a str,
        left: Span,
        /// The property name of a named export.
        key: Option<Span>,
        value: ExportValue<'a>,
        declaration: Span,
    },
    /// Any other `module.exports`, `module.exports.name` or `exports.name`
    /// reference.
    Nested {
        name: Option<&'a str>,
        node: Span,
        /// The reference is the target of an assignment or update.
        is_assignment: bool,
    },
    /// `module` or `exports` used as a plain value.
    Bare,
}

/// What the export writers need to know about an exported value.
#[derive(Debug)]
pub struct ExportValue<'a> {
    pub span: Span,
    pub kind: ValueKind,
    /// Entries of an object literal that can be split into one export per
    /// property.
    pub entries: Option<Vec<ObjectEntry<'a>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// An identifier bound at the top level.
    Binding,
    /// A `require` call that becomes an import binding.
    Import,
    /// A function or class expression with a name.
    NamedFunction,
    AnonymousFunction,
    /// Starts with an unparenthesized function or class expression, such as
    /// an IIFE. `head` spans that expression.
    Iife { head: Span },
    Other,
}

#[derive(Debug)]
pub struct ObjectEntry<'a> {
    pub key: &'a str,
    /// Start of the value text kept in the output. For methods this is the
    /// parameter list.
    pub value_start: u32,
    pub value_end: u32,
    pub value: EntryValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryValue {
    Binding,
    Import,
    Method { is_async: bool, generator: bool },
    Other,
}
