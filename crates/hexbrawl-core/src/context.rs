//! Mutable state threaded through one resolution pass.

use std::collections::BTreeSet;

use crate::arena::Arena;
use crate::config::RuleOptions;
use crate::dice::DiceRoller;
use crate::entity::EntityId;
use crate::report::{Report, ReportLog};
use crate::services::Services;

/// Borrowed view of the engine while a phase resolves.
///
/// The resolver and the destruction cascade work through this instead of the
/// engine itself, so the engine can hand out disjoint borrows of its fields.
pub struct RoundContext<'a> {
    /// Battlefield state
    pub arena: &'a mut Arena,
    /// Optional rules
    pub options: &'a RuleOptions,
    /// Collaborators
    pub services: &'a Services,
    /// The round's dice
    pub dice: &'a mut dyn DiceRoller,
    /// The round's report log
    pub reports: &'a mut ReportLog,
    /// Units whose visible state changed and need a fresh broadcast
    pub touched: &'a mut BTreeSet<EntityId>,
}

impl RoundContext<'_> {
    /// Appends one report.
    pub fn report(&mut self, report: Report) {
        self.reports.push(report);
    }

    /// Appends reports in order.
    pub fn report_all(&mut self, reports: impl IntoIterator<Item = Report>) {
        self.reports.extend(reports);
    }

    /// Marks a unit for a visibility update.
    pub fn touch(&mut self, id: EntityId) {
        self.touched.insert(id);
    }
}

impl std::fmt::Debug for RoundContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundContext")
            .field("round", &self.arena.round())
            .field("options", &self.options)
            .field("reports", &self.reports.len())
            .field("touched", &self.touched)
            .finish_non_exhaustive()
    }
}
