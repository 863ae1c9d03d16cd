use esmify_core::{EditError, ParseFailure};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseFailure),
    #[error("cannot collect exports into a single object without hoisting")]
    HoistDisabled,
    #[error("conflicting edits: {0}")]
    EditConflict(#[from] EditError),
}

/// A fatal transform failure. `pos` is a byte offset into the input when the
/// failure can be pinned to a node.
#[derive(Debug, Error)]
#[error("{kind}{}", at(.pos))]
pub struct TransformError {
    #[source]
    pub kind: TransformErrorKind,
    pub pos: Option<u32>,
}

fn at(pos: &Option<u32>) -> String {
    pos.map(|p| format!(" at index {p}")).unwrap_or_default()
}

impl TransformError {
    pub fn new(kind: TransformErrorKind, pos: Option<u32>) -> Self {
        Self { kind, pos }
    }

    pub fn with_pos_if_missing(mut self, pos: u32) -> Self {
        self.pos.get_or_insert(pos);
        self
    }
}

impl From<EditError> for TransformError {
    fn from(err: EditError) -> Self {
        let pos = err.pos();
        Self::new(TransformErrorKind::EditConflict(err), Some(pos))
    }
}

impl From<ParseFailure> for TransformError {
    fn from(err: ParseFailure) -> Self {
        Self::new(TransformErrorKind::Parse(err), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_position() {
        let err = TransformError::new(TransformErrorKind::HoistDisabled, Some(12));
        assert_eq!(
            err.to_string(),
            "cannot collect exports into a single object without hoisting at index 12"
        );
    }

    #[test]
    fn test_with_pos_if_missing_keeps_existing() {
        let err = TransformError::from(EditError::SplitEdited { pos: 3 }).with_pos_if_missing(9);
        assert_eq!(err.pos, Some(3));
        let err = TransformError::from(ParseFailure { messages: vec![] }).with_pos_if_missing(9);
        assert_eq!(err.pos, Some(9));
    }
}
