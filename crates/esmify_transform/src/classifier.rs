use log::{debug, trace, warn};
use oxc_ast::ast::{
    Argument, ArrowFunctionExpression, AssignmentExpression, AssignmentOperator, AssignmentTarget,
    BindingPatternKind, BlockStatement, CallExpression, CatchClause, Class, Expression,
    ExpressionStatement, ForInStatement, ForOfStatement, ForStatement, Function,
    IdentifierReference, NewExpression, ObjectExpression, ObjectPropertyKind, Program, PropertyKey,
    PropertyKind, SimpleAssignmentTarget, Statement, StaticMemberExpression, SwitchStatement,
    TaggedTemplateExpression, UnaryExpression, UnaryOperator, UpdateExpression,
    VariableDeclaration, VariableDeclarator,
};
use oxc_ast_visit::{Visit, walk};
use oxc_span::{GetSpan, Span};
use oxc_syntax::scope::ScopeFlags;
use std::collections::{BTreeMap, HashSet};

use crate::model::{RootStatement, SourceModel};
use crate::options::{TransformOptions, Warning};
use crate::scope::{ScopeTracker, ScopeTree};
use crate::sites::{
    DeclaredBinding, Declarator, DestructuredProp, EntryValue, ExportObject, ExportShape,
    ExportSite, ExportValue, ObjectEntry, RequireKind, RequireSite, Sibling, ValueKind,
};

/// Everything the writers need, collected in one walk over the program.
#[derive(Debug, Default)]
pub struct Analysis<'a> {
    pub requires: Vec<RequireSite<'a>>,
    pub module_sites: Vec<ExportSite<'a>>,
    pub exports_sites: Vec<ExportSite<'a>>,
    /// Properties read off each imported module, in first-seen order.
    pub imported_properties: BTreeMap<String, Vec<String>>,
    /// Module ids whose binding is called or reassigned.
    pub should_import_default: HashSet<String>,
    /// `typeof exports` or `typeof module.exports` was seen.
    pub need_default_object: bool,
    pub roots: Vec<RootStatement>,
    pub warnings: Vec<Warning>,
    /// Names declared or referenced anywhere in the program.
    pub used_names: HashSet<String>,
}

impl Analysis<'_> {
    pub fn has_cjs(&self) -> bool {
        !self.requires.is_empty() || !self.module_sites.is_empty() || !self.exports_sites.is_empty()
    }

    pub fn last_root(&self) -> Option<RootStatement> {
        self.roots.last().copied()
    }
}

/// A `require("<string>")` call.
struct RequireCall<'a> {
    id: &'a str,
    call: Span,
    arg: Span,
    callee: Span,
}

fn require_call<'a>(call: &CallExpression<'a>) -> Option<RequireCall<'a>> {
    let Expression::Identifier(callee) = &call.callee else { return None };
    if callee.name.as_str() != "require" || call.arguments.len() != 1 {
        return None;
    }
    let Some(Expression::StringLiteral(lit)) = call.arguments[0].as_expression() else {
        return None;
    };
    Some(RequireCall {
        id: lit.value.as_str(),
        call: call.span,
        arg: lit.span,
        callee: callee.span,
    })
}

/// `Promise.resolve(require("x"))`
fn dynamic_require<'a>(call: &CallExpression<'a>) -> Option<RequireCall<'a>> {
    let Expression::StaticMemberExpression(member) = &call.callee else { return None };
    let Expression::Identifier(object) = &member.object else { return None };
    if object.name.as_str() != "Promise"
        || member.property.name.as_str() != "resolve"
        || call.arguments.len() != 1
    {
        return None;
    }
    match &call.arguments[0] {
        Argument::CallExpression(inner) => require_call(inner),
        _ => None,
    }
}

struct DeclaredImport<'a> {
    require: RequireCall<'a>,
    binding: DeclaredBinding<'a>,
    init: Span,
}

/// Recognizes `x = require(..)`, `x = require(..).prop` and
/// `{a, b: c} = require(..)`.
fn declared_import<'a>(declarator: &VariableDeclarator<'a>) -> Option<DeclaredImport<'a>> {
    let init = declarator.init.as_ref()?;
    match init {
        Expression::CallExpression(call) => {
            let require = require_call(call)?;
            let binding = match &declarator.id.kind {
                BindingPatternKind::BindingIdentifier(id) => {
                    DeclaredBinding::Single { local: id.name.as_str() }
                }
                BindingPatternKind::ObjectPattern(pattern) => {
                    if pattern.rest.is_some() {
                        return None;
                    }
                    let mut props = Vec::with_capacity(pattern.properties.len());
                    for prop in &pattern.properties {
                        let PropertyKey::StaticIdentifier(key) = &prop.key else { return None };
                        let BindingPatternKind::BindingIdentifier(local) = &prop.value.kind else {
                            return None;
                        };
                        if prop.computed {
                            return None;
                        }
                        props.push(DestructuredProp {
                            key: key.name.as_str(),
                            key_span: key.span,
                            value_span: local.span,
                        });
                    }
                    DeclaredBinding::Destructured { pattern: pattern.span, props }
                }
                _ => return None,
            };
            Some(DeclaredImport { require, binding, init: call.span })
        }
        Expression::StaticMemberExpression(member) => {
            let Expression::CallExpression(call) = &member.object else { return None };
            let require = require_call(call)?;
            let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind else {
                return None;
            };
            Some(DeclaredImport {
                require,
                binding: DeclaredBinding::Property {
                    local: id.name.as_str(),
                    property: member.property.name.as_str(),
                },
                init: member.span,
            })
        }
        _ => None,
    }
}

/// The `module`/`exports` part of an export reference.
struct ExportRef<'a> {
    object: ExportObject,
    leftmost: Span,
    name: Option<&'a str>,
    key: Option<Span>,
    module_exports: Option<Span>,
}

impl ExportRef<'_> {
    fn bare(object: ExportObject, leftmost: Span) -> Self {
        Self { object, leftmost, name: None, key: None, module_exports: None }
    }
}

fn is_module_exports(member: &StaticMemberExpression<'_>) -> Option<Span> {
    match &member.object {
        Expression::Identifier(object)
            if object.name.as_str() == "module" && member.property.name.as_str() == "exports" =>
        {
            Some(object.span)
        }
        _ => None,
    }
}

/// Matches `module.exports`, `module.exports.name` and `exports.name`.
fn export_ref<'a>(member: &StaticMemberExpression<'a>) -> Option<ExportRef<'a>> {
    if let Some(leftmost) = is_module_exports(member) {
        return Some(ExportRef {
            object: ExportObject::Module,
            leftmost,
            name: None,
            key: None,
            module_exports: Some(member.span),
        });
    }
    let name = Some(member.property.name.as_str());
    let key = Some(member.property.span);
    match &member.object {
        Expression::StaticMemberExpression(inner) => {
            let leftmost = is_module_exports(inner)?;
            Some(ExportRef {
                object: ExportObject::Module,
                leftmost,
                name,
                key,
                module_exports: Some(inner.span),
            })
        }
        Expression::Identifier(object) if object.name.as_str() == "exports" => Some(ExportRef {
            object: ExportObject::Exports,
            leftmost: object.span,
            name,
            key,
            module_exports: None,
        }),
        _ => None,
    }
}

fn assigned_export_ref<'a>(target: &AssignmentTarget<'a>) -> Option<ExportRef<'a>> {
    match target {
        AssignmentTarget::StaticMemberExpression(member) => export_ref(member),
        _ => None,
    }
}

/// Leftmost identifier of a member chain.
fn leftmost_name<'a>(mut expr: &Expression<'a>) -> Option<&'a str> {
    loop {
        match expr {
            Expression::Identifier(id) => return Some(id.name.as_str()),
            Expression::StaticMemberExpression(member) => expr = &member.object,
            Expression::ComputedMemberExpression(member) => expr = &member.object,
            Expression::ParenthesizedExpression(paren) => expr = &paren.expression,
            _ => return None,
        }
    }
}

fn simple_target_leftmost<'a>(target: &SimpleAssignmentTarget<'a>) -> Option<&'a str> {
    match target {
        SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => Some(id.name.as_str()),
        SimpleAssignmentTarget::StaticMemberExpression(member) => leftmost_name(&member.object),
        SimpleAssignmentTarget::ComputedMemberExpression(member) => leftmost_name(&member.object),
        _ => None,
    }
}

fn target_leftmost<'a>(target: &AssignmentTarget<'a>) -> Option<&'a str> {
    match target {
        AssignmentTarget::AssignmentTargetIdentifier(id) => Some(id.name.as_str()),
        AssignmentTarget::StaticMemberExpression(member) => leftmost_name(&member.object),
        AssignmentTarget::ComputedMemberExpression(member) => leftmost_name(&member.object),
        _ => None,
    }
}

/// Whether `expr` assigns straight to `module` or `exports`, as in
/// `module.exports = exports = {}`.
fn is_chained_assignment(expr: &Expression<'_>) -> bool {
    let Expression::AssignmentExpression(inner) = expr.without_parentheses() else {
        return false;
    };
    match &inner.left {
        AssignmentTarget::AssignmentTargetIdentifier(id) => {
            matches!(id.name.as_str(), "module" | "exports")
        }
        target => assigned_export_ref(target).is_some_and(|r| r.name.is_none()),
    }
}

/// The function or class expression an expression starts with, following
/// callees, member objects and tags.
fn head_function(mut expr: &Expression<'_>) -> Option<Span> {
    loop {
        match expr {
            Expression::FunctionExpression(f) => return Some(f.span),
            Expression::ClassExpression(c) => return Some(c.span),
            Expression::CallExpression(call) => expr = &call.callee,
            Expression::StaticMemberExpression(member) => expr = &member.object,
            Expression::ComputedMemberExpression(member) => expr = &member.object,
            Expression::TaggedTemplateExpression(tagged) => expr = &tagged.tag,
            _ => return None,
        }
    }
}

struct Classifier<'a, 'o> {
    options: &'o TransformOptions,
    model: SourceModel,
    tree: ScopeTree,
    scopes: ScopeTracker,
    /// Require calls whose result is called, constructed, tagged or extended.
    callable: HashSet<Span>,
    /// Targets of assignments and updates.
    assign_targets: HashSet<Span>,
    /// Depth of function bodies walked only for dynamic imports.
    dynamic_only: usize,
    out: Analysis<'a>,
}

/// Walks `program` once and classifies every CommonJS construct in it.
pub fn classify<'a>(program: &Program<'a>, options: &TransformOptions) -> Analysis<'a> {
    let tree = ScopeTree::build(program);
    let scopes = ScopeTracker::new(&tree);
    let mut classifier = Classifier {
        options,
        model: SourceModel::default(),
        tree,
        scopes,
        callable: HashSet::new(),
        assign_targets: HashSet::new(),
        dynamic_only: 0,
        out: Analysis::default(),
    };
    classifier.visit_program(program);

    let Classifier { model, tree, mut out, .. } = classifier;
    out.roots = model.into_roots();
    out.used_names = tree.into_used_names();
    debug!(
        "Classified {} requires, {} module and {} exports references",
        out.requires.len(),
        out.module_sites.len(),
        out.exports_sites.len()
    );
    out
}

impl<'a> Classifier<'a, '_> {
    fn full(&self) -> bool {
        self.dynamic_only == 0
    }

    fn shadowed(&self, name: &str) -> bool {
        self.tree.contains(self.scopes.current(), name)
    }

    fn root_start(&self) -> u32 {
        self.model.root().map_or(0, |r| r.start)
    }

    fn warn(&mut self, message: &str, pos: u32) {
        let warning = Warning { message: message.to_string(), pos };
        match &self.options.warn {
            Some(sink) => sink(&warning),
            None => warn!("{} at index {}", message, pos),
        }
        self.out.warnings.push(warning);
    }

    fn imported_from(&self, name: &str) -> Option<String> {
        self.tree.imported_from(self.scopes.current(), name).map(str::to_string)
    }

    fn add_imported_property(&mut self, id: &str, property: &str) {
        let names = self.out.imported_properties.entry(id.to_string()).or_default();
        if !names.iter().any(|n| n == property) {
            names.push(property.to_string());
        }
    }

    fn add_require(&mut self, require: RequireCall<'a>, kind: RequireKind<'a>) {
        trace!("require({:?}) at {}", require.id, require.call.start);
        let callable = self.callable.contains(&require.call);
        let root = self.root_start();
        self.out.requires.push(RequireSite {
            id: require.id,
            call: require.call,
            arg: require.arg,
            callee: require.callee,
            root,
            kind,
            callable,
        });
    }

    fn add_export(&mut self, target: ExportRef<'_>, shape: ExportShape<'a>) {
        let site = ExportSite {
            object: target.object,
            leftmost: target.leftmost,
            module_exports: target.module_exports,
            root: self.root_start(),
            shape,
        };
        match site.object {
            ExportObject::Module => self.out.module_sites.push(site),
            ExportObject::Exports => self.out.exports_sites.push(site),
        }
    }

    /// A binding holding an imported module is used as a function or class,
    /// or the result of a require call is.
    fn mark_callable(&mut self, expr: &Expression<'a>) {
        match expr.without_parentheses() {
            Expression::Identifier(id) => {
                if let Some(module) = self.imported_from(id.name.as_str()) {
                    self.out.should_import_default.insert(module);
                }
            }
            Expression::CallExpression(call) if require_call(call).is_some() => {
                self.callable.insert(call.span);
            }
            _ => {}
        }
    }

    fn mark_reassigned(&mut self, leftmost: Option<&str>) {
        if let Some(name) = leftmost
            && let Some(module) = self.imported_from(name)
        {
            self.out.should_import_default.insert(module);
        }
    }

    fn is_import(&self, expr: &Expression<'a>) -> bool {
        matches!(expr.without_parentheses(), Expression::CallExpression(call)
            if require_call(call).is_some() && !self.shadowed("require"))
    }

    fn is_top_level_binding(&self, expr: &Expression<'a>) -> bool {
        matches!(expr, Expression::Identifier(id)
            if self.tree.is_global_declared(self.scopes.current(), id.name.as_str()))
    }

    fn describe_value(&self, expr: &Expression<'a>) -> ExportValue<'a> {
        let kind = if self.is_top_level_binding(expr) {
            ValueKind::Binding
        } else if self.is_import(expr) {
            ValueKind::Import
        } else {
            match expr {
                Expression::FunctionExpression(f) if f.id.is_some() => ValueKind::NamedFunction,
                Expression::ClassExpression(c) if c.id.is_some() => ValueKind::NamedFunction,
                Expression::FunctionExpression(_) | Expression::ClassExpression(_) => {
                    ValueKind::AnonymousFunction
                }
                other => match head_function(other) {
                    Some(head) => ValueKind::Iife { head },
                    None => ValueKind::Other,
                },
            }
        };
        let entries = match expr {
            Expression::ObjectExpression(object) => self.object_entries(object),
            _ => None,
        };
        ExportValue { span: expr.span(), kind, entries }
    }

    /// Entries of an object literal made only of plain, uniquely named
    /// properties whose functions do not refer to `this`.
    fn object_entries(&self, object: &ObjectExpression<'a>) -> Option<Vec<ObjectEntry<'a>>> {
        if object.properties.is_empty() {
            return None;
        }
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = property else { return None };
            let PropertyKey::StaticIdentifier(key) = &prop.key else { return None };
            if prop.computed || prop.kind != PropertyKind::Init || !seen.insert(key.name.as_str())
            {
                return None;
            }

            let value = &prop.value;
            let mut value_start = value.span().start;
            let entry_value = match value {
                Expression::FunctionExpression(f) => {
                    if self.tree.uses_this(f.span) {
                        return None;
                    }
                    if prop.method {
                        value_start = f.params.span.start;
                        EntryValue::Method { is_async: f.r#async, generator: f.generator }
                    } else {
                        EntryValue::Other
                    }
                }
                _ if self.is_top_level_binding(value) => EntryValue::Binding,
                _ if self.is_import(value) => EntryValue::Import,
                _ => EntryValue::Other,
            };
            entries.push(ObjectEntry {
                key: key.name.as_str(),
                value_start,
                value_end: value.span().end,
                value: entry_value,
            });
        }
        Some(entries)
    }

    /// `module.exports[.name] = value;` or `exports.name = value;` as a whole
    /// top-level statement.
    fn classify_assign(&mut self, assign: &AssignmentExpression<'a>, statement: Span) -> bool {
        if assign.operator != AssignmentOperator::Assign {
            return false;
        }
        let Some(target) = assigned_export_ref(&assign.left) else { return false };
        if self.shadowed(target.object.name()) {
            return false;
        }
        let value = self.describe_value(&assign.right);
        let chained = is_chained_assignment(&assign.right);
        let name = target.name;
        self.add_export(
            target,
            ExportShape::Assign {
                name,
                left: assign.left.span(),
                value,
                statement,
                chained,
            },
        );
        self.visit_expression(&assign.right);
        true
    }

    /// `const id = module.exports[.name] = value;`
    fn classify_declare(
        &mut self,
        declaration: &VariableDeclaration<'a>,
        declarator: &VariableDeclarator<'a>,
    ) -> bool {
        let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind else { return false };
        let Some(Expression::AssignmentExpression(assign)) = &declarator.init else {
            return false;
        };
        if assign.operator != AssignmentOperator::Assign {
            return false;
        }
        let Some(target) = assigned_export_ref(&assign.left) else { return false };
        if self.shadowed(target.object.name()) {
            return false;
        }
        let value = self.describe_value(&assign.right);
        let (name, key) = (target.name, target.key);
        self.add_export(
            target,
            ExportShape::Declare {
                name,
                id: id.name.as_str(),
                id_span: id.span,
                kind: declaration.kind.as_str(),
                left: assign.left.span(),
                key,
                value,
                declaration: declaration.span,
            },
        );
        self.visit_expression(&assign.right);
        true
    }

    fn classify_declared_import(
        &mut self,
        declaration: &VariableDeclaration<'a>,
        index: usize,
        import: DeclaredImport<'a>,
        top: bool,
    ) {
        let DeclaredImport { require, binding, init } = import;
        let scope = self.scopes.current();
        match &binding {
            DeclaredBinding::Single { local } => {
                self.tree.set_imported_from(scope, local, require.id);
            }
            DeclaredBinding::Property { property, .. } => {
                self.add_imported_property(require.id, property);
            }
            DeclaredBinding::Destructured { props, .. } => {
                for prop in props {
                    self.add_imported_property(require.id, prop.key);
                }
            }
        }

        if !top {
            self.add_require(require, RequireKind::Inline);
            return;
        }
        let sibling = |d: &VariableDeclarator<'a>| Sibling {
            span: d.span,
            is_require: declared_import(d).is_some(),
        };
        let declarations = &declaration.declarations;
        let declarator = &declarations[index];
        let kind = RequireKind::Declared(Declarator {
            binding,
            node: declarator.span,
            left: declarator.id.span(),
            declaration: declaration.span,
            kind: declaration.kind.as_str(),
            init,
            prev: index.checked_sub(1).map(|i| sibling(&declarations[i])),
            next: declarations.get(index + 1).map(sibling),
        });
        self.add_require(require, kind);
    }

    fn with_scope<F: FnOnce(&mut Self)>(&mut self, span: Span, f: F) {
        let entered = self.scopes.enter(&self.tree, span);
        f(self);
        if entered {
            self.scopes.leave();
        }
    }

    /// Code below the top level is walked fully in nested mode, only for
    /// dynamic imports when those are enabled, and skipped otherwise.
    fn below_top_level<F: FnOnce(&mut Self)>(&mut self, f: F) {
        if self.options.nested {
            f(self);
            return;
        }
        if !self.options.dynamic_import {
            return;
        }
        self.dynamic_only += 1;
        f(self);
        self.dynamic_only -= 1;
    }

    fn with_function_body<F: FnOnce(&mut Self)>(&mut self, span: Span, f: F) {
        self.below_top_level(|c| c.with_scope(span, f));
    }
}

impl<'a> Visit<'a> for Classifier<'a, '_> {
    fn visit_statement(&mut self, it: &Statement<'a>) {
        let is_root = self.model.root().is_none();
        self.model.enter_statement(it.span());
        if is_root {
            walk::walk_statement(self, it);
        } else {
            self.below_top_level(|c| walk::walk_statement(c, it));
        }
        self.model.leave_statement();
    }

    fn visit_expression_statement(&mut self, it: &ExpressionStatement<'a>) {
        if self.full() && self.model.is_top(it.span) {
            if let Expression::CallExpression(call) = &it.expression
                && self.model.is_top_child(it.span)
                && let Some(require) = require_call(call)
                && !self.shadowed("require")
            {
                self.add_require(require, RequireKind::Bare);
                return;
            }
            if let Expression::AssignmentExpression(assign) = &it.expression
                && self.classify_assign(assign, it.span)
            {
                return;
            }
        }
        walk::walk_expression_statement(self, it);
    }

    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        if !self.full() {
            walk::walk_variable_declaration(self, it);
            return;
        }
        let top = self.model.is_top_child(it.span);
        let require_shadowed = self.shadowed("require");
        for (index, declarator) in it.declarations.iter().enumerate() {
            if !require_shadowed && let Some(import) = declared_import(declarator) {
                self.classify_declared_import(it, index, import, top);
                continue;
            }
            if top && it.declarations.len() == 1 && self.classify_declare(it, declarator) {
                continue;
            }
            self.visit_variable_declarator(declarator);
        }
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if self.options.dynamic_import
            && let Some(require) = dynamic_require(it)
            && !self.shadowed("require")
        {
            self.add_require(require, RequireKind::Dynamic { span: it.span });
            return;
        }
        if !self.full() {
            walk::walk_call_expression(self, it);
            return;
        }
        if let Some(require) = require_call(it)
            && !self.shadowed("require")
        {
            self.add_require(require, RequireKind::Inline);
            return;
        }
        self.mark_callable(&it.callee);
        walk::walk_call_expression(self, it);
    }

    fn visit_new_expression(&mut self, it: &NewExpression<'a>) {
        if self.full() {
            self.mark_callable(&it.callee);
        }
        walk::walk_new_expression(self, it);
    }

    fn visit_tagged_template_expression(&mut self, it: &TaggedTemplateExpression<'a>) {
        if self.full() {
            self.mark_callable(&it.tag);
        }
        walk::walk_tagged_template_expression(self, it);
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        if self.full()
            && let Some(super_class) = &it.super_class
        {
            self.mark_callable(super_class);
        }
        walk::walk_class(self, it);
    }

    fn visit_assignment_expression(&mut self, it: &AssignmentExpression<'a>) {
        if self.full() {
            self.mark_reassigned(target_leftmost(&it.left));
            self.assign_targets.insert(it.left.span());
        }
        walk::walk_assignment_expression(self, it);
    }

    fn visit_update_expression(&mut self, it: &UpdateExpression<'a>) {
        if self.full() {
            self.mark_reassigned(simple_target_leftmost(&it.argument));
            self.assign_targets.insert(it.argument.span());
        }
        walk::walk_update_expression(self, it);
    }

    fn visit_unary_expression(&mut self, it: &UnaryExpression<'a>) {
        if self.full() && it.operator == UnaryOperator::Typeof {
            let is_exports_object = match it.argument.without_parentheses() {
                Expression::Identifier(id) => {
                    id.name.as_str() == "exports" && !self.shadowed("exports")
                }
                Expression::StaticMemberExpression(member) => {
                    is_module_exports(member).is_some() && !self.shadowed("module")
                }
                _ => false,
            };
            if is_exports_object {
                self.out.need_default_object = true;
            }
        }
        walk::walk_unary_expression(self, it);
    }

    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        if self.full() {
            if let Some(target) = export_ref(it)
                && !self.shadowed(target.object.name())
            {
                let is_assignment = self.assign_targets.contains(&it.span);
                let name = target.name;
                let shape = ExportShape::Nested { name, node: it.span, is_assignment };
                self.add_export(target, shape);
                return;
            }
            if let Expression::Identifier(object) = &it.object
                && let Some(module) = self.imported_from(object.name.as_str())
            {
                self.add_imported_property(&module, it.property.name.as_str());
            }
        }
        walk::walk_static_member_expression(self, it);
    }

    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if !self.full() {
            return;
        }
        match it.name.as_str() {
            "module" if !self.shadowed("module") => {
                let target = ExportRef::bare(ExportObject::Module, it.span);
                self.add_export(target, ExportShape::Bare);
            }
            "exports" if !self.shadowed("exports") => {
                let target = ExportRef::bare(ExportObject::Exports, it.span);
                self.add_export(target, ExportShape::Bare);
            }
            "require" if !self.shadowed("require") => {
                self.warn("Unconverted `require`", it.span.start);
            }
            _ => {}
        }
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        self.with_function_body(it.span, |c| walk::walk_function(c, it, flags));
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        self.with_function_body(it.span, |c| walk::walk_arrow_function_expression(c, it));
    }

    fn visit_block_statement(&mut self, it: &BlockStatement<'a>) {
        self.with_scope(it.span, |c| walk::walk_block_statement(c, it));
    }

    fn visit_for_statement(&mut self, it: &ForStatement<'a>) {
        self.with_scope(it.span, |c| walk::walk_for_statement(c, it));
    }

    fn visit_for_in_statement(&mut self, it: &ForInStatement<'a>) {
        self.with_scope(it.span, |c| walk::walk_for_in_statement(c, it));
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        self.with_scope(it.span, |c| walk::walk_for_of_statement(c, it));
    }

    fn visit_switch_statement(&mut self, it: &SwitchStatement<'a>) {
        self.with_scope(it.span, |c| walk::walk_switch_statement(c, it));
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        self.with_scope(it.span, |c| walk::walk_catch_clause(c, it));
    }
}
