use crate::program::ProgramId;

/// Per-controller performance history for one generation.
///
/// Controllers appear in the order they were first recorded and each history
/// keeps its records in tick order. Nothing is ever sorted.
#[derive(Debug, Clone)]
pub struct PerformanceLedger<R> {
    entries: Vec<(ProgramId, Vec<R>)>,
}

impl<R> Default for PerformanceLedger<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R> PerformanceLedger<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: ProgramId, value: R) {
        match self.entries.iter_mut().find(|(key, _)| *key == id) {
            Some((_, history)) => history.push(value),
            None => self.entries.push((id, vec![value])),
        }
    }

    #[must_use]
    pub fn history(&self, id: ProgramId) -> Option<&[R]> {
        self.entries
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, history)| history.as_slice())
    }

    /// Controllers with at least one record, in first-recorded order.
    pub fn ids(&self) -> impl Iterator<Item = ProgramId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Number of controllers with records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
