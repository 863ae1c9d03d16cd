use log::trace;
use oxc_ast::ast::{
    ArrowFunctionExpression, BindingIdentifier, BlockStatement, CatchClause, Class,
    ForInStatement, ForOfStatement, ForStatement, Function, IdentifierReference, Program, Super,
    SwitchStatement, ThisExpression, VariableDeclaration, VariableDeclarationKind,
};
use oxc_ast_visit::{Visit, walk};
use oxc_span::Span;
use oxc_syntax::scope::ScopeFlags;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    Arrow,
    Block,
}

impl ScopeKind {
    /// `var` and function declarations land in the nearest scope of one of
    /// these kinds.
    fn is_function_boundary(self) -> bool {
        !matches!(self, ScopeKind::Block)
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    bindings: HashSet<String>,
    uses_this: bool,
}

/// Lexical scopes of a program, keyed by the span of the node that opens
/// them.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    by_span: HashMap<Span, ScopeId>,
    imported_from: HashMap<(ScopeId, String), String>,
    /// Names declared or referenced anywhere in the program.
    used_names: HashSet<String>,
}

impl ScopeTree {
    pub fn build(program: &Program<'_>) -> Self {
        let mut builder = ScopeBuilder::new(program.span);
        builder.visit_program(program);
        trace!("Built {} scopes", builder.tree.scopes.len());
        builder.tree
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope_for(&self, span: Span) -> Option<ScopeId> {
        self.by_span.get(&span).copied()
    }

    /// The scope that declares `name` as seen from `scope`.
    pub fn declaring_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0];
            if s.bindings.contains(name) {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    /// Whether `name` resolves to a declaration visible from `scope`.
    pub fn contains(&self, scope: ScopeId, name: &str) -> bool {
        self.declaring_scope(scope, name).is_some()
    }

    /// Whether `name`, seen from `scope`, is declared at the top level.
    pub fn is_global_declared(&self, scope: ScopeId, name: &str) -> bool {
        self.declaring_scope(scope, name) == Some(self.root())
    }

    /// Whether the function opened at `span` refers to its own `this` or
    /// `super`.
    pub fn uses_this(&self, span: Span) -> bool {
        self.scope_for(span).is_some_and(|id| self.scopes[id.0].uses_this)
    }

    /// Records that `name` (as seen from `scope`) holds the module `id`.
    pub fn set_imported_from(&mut self, scope: ScopeId, name: &str, id: &str) {
        if let Some(owner) = self.declaring_scope(scope, name) {
            self.imported_from.insert((owner, name.to_string()), id.to_string());
        }
    }

    pub fn imported_from(&self, scope: ScopeId, name: &str) -> Option<&str> {
        let owner = self.declaring_scope(scope, name)?;
        self.imported_from.get(&(owner, name.to_string())).map(String::as_str)
    }

    /// Every name declared or referenced anywhere in the program.
    pub fn into_used_names(self) -> HashSet<String> {
        self.used_names
    }
}

/// The chain of scopes enclosing the current walk position.
#[derive(Debug)]
pub struct ScopeTracker {
    stack: Vec<ScopeId>,
}

impl ScopeTracker {
    pub fn new(tree: &ScopeTree) -> Self {
        Self { stack: vec![tree.root()] }
    }

    pub fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeId(0))
    }

    /// Enters the scope opened at `span`, if there is one.
    pub fn enter(&mut self, tree: &ScopeTree, span: Span) -> bool {
        match tree.scope_for(span) {
            Some(id) => {
                self.stack.push(id);
                true
            }
            None => false,
        }
    }

    pub fn leave(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }
}

struct ScopeBuilder {
    tree: ScopeTree,
    stack: Vec<ScopeId>,
    /// Where binding identifiers met while walking a pattern are declared.
    binding_target: Option<ScopeId>,
}

impl ScopeBuilder {
    fn new(program_span: Span) -> Self {
        let mut builder = Self {
            tree: ScopeTree {
                scopes: Vec::new(),
                by_span: HashMap::new(),
                imported_from: HashMap::new(),
                used_names: HashSet::new(),
            },
            stack: Vec::new(),
            binding_target: None,
        };
        builder.push(program_span, ScopeKind::Program);
        builder
    }

    fn push(&mut self, span: Span, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.tree.scopes.len());
        self.tree.scopes.push(Scope {
            parent: self.stack.last().copied(),
            kind,
            bindings: HashSet::new(),
            uses_this: false,
        });
        self.tree.by_span.insert(span, id);
        self.stack.push(id);
        id
    }

    fn pop(&mut self) {
        self.stack.pop();
    }

    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeId(0))
    }

    fn nearest_function(&self) -> ScopeId {
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|id| self.tree.scopes[id.0].kind.is_function_boundary())
            .unwrap_or(ScopeId(0))
    }

    fn declare(&mut self, scope: ScopeId, name: &str) {
        self.tree.scopes[scope.0].bindings.insert(name.to_string());
        self.tree.used_names.insert(name.to_string());
    }

    fn mark_this(&mut self) {
        let owner = self.stack.iter().rev().copied().find(|id| {
            matches!(self.tree.scopes[id.0].kind, ScopeKind::Function | ScopeKind::Program)
        });
        if let Some(id) = owner {
            self.tree.scopes[id.0].uses_this = true;
        }
    }

    fn with_block<F: FnOnce(&mut Self)>(&mut self, span: Span, f: F) {
        self.push(span, ScopeKind::Block);
        f(self);
        self.pop();
    }
}

impl<'a> Visit<'a> for ScopeBuilder {
    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        let target = if matches!(it.kind, VariableDeclarationKind::Var) {
            self.nearest_function()
        } else {
            self.current()
        };
        for declarator in &it.declarations {
            self.binding_target = Some(target);
            self.visit_binding_pattern(&declarator.id);
            self.binding_target = None;
            if let Some(init) = &declarator.init {
                self.visit_expression(init);
            }
        }
    }

    fn visit_function(&mut self, it: &Function<'a>, _flags: ScopeFlags) {
        let saved = self.binding_target.take();
        if it.is_declaration()
            && let Some(id) = &it.id
        {
            let owner = self.nearest_function();
            self.declare(owner, id.name.as_str());
        }

        let scope = self.push(it.span, ScopeKind::Function);
        if !it.is_declaration()
            && let Some(id) = &it.id
        {
            self.declare(scope, id.name.as_str());
        }
        self.binding_target = Some(scope);
        self.visit_formal_parameters(&it.params);
        self.binding_target = None;
        if let Some(body) = &it.body {
            self.visit_function_body(body);
        }
        self.pop();
        self.binding_target = saved;
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        let saved = self.binding_target.take();
        let scope = self.push(it.span, ScopeKind::Arrow);
        self.binding_target = Some(scope);
        self.visit_formal_parameters(&it.params);
        self.binding_target = None;
        self.visit_function_body(&it.body);
        self.pop();
        self.binding_target = saved;
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        let saved = self.binding_target.take();
        if it.is_declaration()
            && let Some(id) = &it.id
        {
            let scope = self.current();
            self.declare(scope, id.name.as_str());
        }
        walk::walk_class(self, it);
        self.binding_target = saved;
    }

    fn visit_block_statement(&mut self, it: &BlockStatement<'a>) {
        self.with_block(it.span, |b| walk::walk_block_statement(b, it));
    }

    fn visit_for_statement(&mut self, it: &ForStatement<'a>) {
        self.with_block(it.span, |b| walk::walk_for_statement(b, it));
    }

    fn visit_for_in_statement(&mut self, it: &ForInStatement<'a>) {
        self.with_block(it.span, |b| walk::walk_for_in_statement(b, it));
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        self.with_block(it.span, |b| walk::walk_for_of_statement(b, it));
    }

    fn visit_switch_statement(&mut self, it: &SwitchStatement<'a>) {
        self.with_block(it.span, |b| walk::walk_switch_statement(b, it));
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        self.with_block(it.span, |b| {
            if let Some(param) = &it.param {
                b.binding_target = Some(b.current());
                b.visit_binding_pattern(&param.pattern);
                b.binding_target = None;
            }
            b.visit_block_statement(&it.body);
        });
    }

    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        match self.binding_target {
            Some(scope) => self.declare(scope, it.name.as_str()),
            None => {
                self.tree.used_names.insert(it.name.to_string());
            }
        }
    }

    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        self.tree.used_names.insert(it.name.to_string());
    }

    fn visit_this_expression(&mut self, _it: &ThisExpression) {
        self.mark_this();
    }

    fn visit_super(&mut self, _it: &Super) {
        self.mark_this();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esmify_core::parse_program;
    use oxc_allocator::Allocator;
    use oxc_span::SourceType;

    fn build(src: &str) -> ScopeTree {
        let allocator = Allocator::default();
        let program =
            parse_program(&allocator, src, SourceType::default().with_module(false)).unwrap();
        ScopeTree::build(&program)
    }

    fn span_of(src: &str, needle: &str, len: usize) -> Span {
        let start = src.find(needle).unwrap() as u32;
        Span::new(start, start + len as u32)
    }

    #[test]
    fn test_top_level_declarations() {
        let tree = build("var a = 1; let b; function c() {} class D {}");
        let root = tree.root();
        for name in ["a", "b", "c", "D"] {
            assert!(tree.is_global_declared(root, name), "{name}");
        }
        assert!(!tree.contains(root, "require"));
    }

    #[test]
    fn test_var_hoists_out_of_blocks() {
        let src = "function f(p) { { var v; let l; } }";
        let tree = build(src);
        let function = tree.scope_for(span_of(src, "function", src.len())).unwrap();
        assert!(tree.contains(function, "v"));
        assert!(tree.contains(function, "p"));
        assert!(!tree.contains(function, "l"));
        assert!(!tree.contains(tree.root(), "v"));
    }

    #[test]
    fn test_catch_and_arrow_params() {
        let src = "try {} catch (require) { x; }\nconst g = (module) => module;";
        let tree = build(src);
        let catch = tree.scope_for(span_of(src, "catch", "catch (require) { x; }".len()));
        assert!(tree.contains(catch.unwrap(), "require"));
        assert!(!tree.contains(tree.root(), "require"));

        let arrow = tree.scope_for(span_of(src, "(module)", "(module) => module".len()));
        assert!(tree.contains(arrow.unwrap(), "module"));
        assert!(!tree.contains(tree.root(), "module"));
    }

    #[test]
    fn test_uses_this_skips_arrows() {
        let src = "var o = {a: function() { return () => this; }, b: function() {}};";
        let tree = build(src);
        let a = src.find("function").unwrap() as u32;
        let a_end = src.find("},").unwrap() as u32 + 1;
        assert!(tree.uses_this(Span::new(a, a_end)));

        let b = src.rfind("function").unwrap() as u32;
        assert!(!tree.uses_this(Span::new(b, b + "function() {}".len() as u32)));
    }

    #[test]
    fn test_imported_from_follows_declaring_scope() {
        let mut tree = build("const foo = require('foo'); function f() { foo(); }");
        let root = tree.root();
        tree.set_imported_from(root, "foo", "foo");
        assert_eq!(tree.imported_from(root, "foo"), Some("foo"));
        assert_eq!(tree.imported_from(root, "bar"), None);
        let used = tree.into_used_names();
        assert!(used.contains("foo"));
        assert!(used.contains("f"));
        assert!(!used.contains("bar"));
    }
}
