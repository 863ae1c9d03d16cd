use oxc_span::Span;

/// A direct child of the program body, used as an anchor for inserted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootStatement {
    pub start: u32,
    pub end: u32,
}

/// Tracks statement nesting during the classification walk and records every
/// top-level statement in source order.
#[derive(Debug, Default)]
pub struct SourceModel {
    roots: Vec<RootStatement>,
    depth: usize,
}

impl SourceModel {
    pub fn enter_statement(&mut self, span: Span) {
        if self.depth == 0 {
            self.roots.push(RootStatement { start: span.start, end: span.end });
        }
        self.depth += 1;
    }

    pub fn leave_statement(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Whether the statement spanning `span` is the top-level statement
    /// currently being walked.
    pub fn is_top(&self, span: Span) -> bool {
        self.depth == 1
            && self.roots.last().is_some_and(|r| r.start == span.start && r.end == span.end)
    }

    /// Whether a node whose parent spans `parent` is a direct child of a
    /// top-level statement.
    pub fn is_top_child(&self, parent: Span) -> bool {
        self.is_top(parent)
    }

    /// The top-level statement enclosing the walk position.
    pub fn root(&self) -> Option<RootStatement> {
        if self.depth == 0 { None } else { self.roots.last().copied() }
    }

    pub fn into_roots(self) -> Vec<RootStatement> {
        self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_are_recorded_once() {
        let mut model = SourceModel::default();
        model.enter_statement(Span::new(0, 10));
        assert!(model.is_top(Span::new(0, 10)));
        model.enter_statement(Span::new(2, 8));
        assert!(!model.is_top(Span::new(2, 8)));
        assert!(!model.is_top_child(Span::new(2, 8)));
        assert_eq!(model.root(), Some(RootStatement { start: 0, end: 10 }));
        model.leave_statement();
        model.leave_statement();
        assert_eq!(model.root(), None);

        model.enter_statement(Span::new(11, 20));
        model.leave_statement();
        let roots = model.into_roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[1], RootStatement { start: 11, end: 20 });
    }
}
