//! Diagnostic collection with ordering and warning suppression.

use crate::{Diagnostic, Severity};

/// Collects one phase's diagnostics before rendering.
///
/// `flush` orders diagnostics by source position and suppresses warnings
/// when any error is present, so reports lead with what actually blocks
/// the user.
#[derive(Default, Debug)]
pub struct DiagnosticQueue {
    diags: Vec<Diagnostic>,
}

impl DiagnosticQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    /// Add every diagnostic from an iterator.
    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        self.diags.extend(diags);
    }

    /// Whether any queued diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(|d| d.severity.is_error())
    }

    /// Number of queued diagnostics.
    pub fn len(&self) -> usize {
        self.diags.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Drain the queue in render order.
    ///
    /// Stable-sorts by primary region start (diagnostics without a region
    /// sort first); drops warnings and notes if any error is queued.
    pub fn flush(mut self) -> Vec<Diagnostic> {
        let has_errors = self.has_errors();
        if has_errors {
            self.diags.retain(|d| d.severity == Severity::Error);
        }
        self.diags
            .sort_by_key(|d| d.region.map_or(0, |region| region.start));
        self.diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;
    use rill_ir::Region;

    #[test]
    fn warnings_suppressed_when_errors_present() {
        let mut queue = DiagnosticQueue::new();
        queue.push(Diagnostic::warning(ErrorCode::E3002).with_region(Region::new(0, 1)));
        queue.push(Diagnostic::error(ErrorCode::E3001).with_region(Region::new(5, 6)));
        let flushed = queue.flush();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].code, ErrorCode::E3001);
    }

    #[test]
    fn warnings_kept_when_no_errors() {
        let mut queue = DiagnosticQueue::new();
        queue.push(Diagnostic::warning(ErrorCode::E3002));
        assert!(!queue.has_errors());
        assert_eq!(queue.flush().len(), 1);
    }

    #[test]
    fn flush_orders_by_region_start() {
        let mut queue = DiagnosticQueue::new();
        queue.push(Diagnostic::error(ErrorCode::E3001).with_region(Region::new(10, 12)));
        queue.push(Diagnostic::error(ErrorCode::E3003).with_region(Region::new(2, 4)));
        let flushed = queue.flush();
        assert_eq!(flushed[0].code, ErrorCode::E3003);
        assert_eq!(flushed[1].code, ErrorCode::E3001);
    }
}
