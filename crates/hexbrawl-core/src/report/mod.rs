//! Structured report records.
//!
//! Every observable consequence of a round is a [`Report`]: a template id,
//! a visibility class, the entity the report is about, and its parameters.
//! Reports are appended to a [`ReportLog`] in the order events happen and are
//! never modified afterwards. Per-observer views (see [`filter`]) are copies.
//!
//! # Example
//!
//! ```
//! use hexbrawl_core::entity::EntityId;
//! use hexbrawl_core::report::{codes, Report, ReportCatalog};
//!
//! let report = Report::visible(codes::DAMAGE, EntityId::new(3))
//!     .add("Atlas")
//!     .add(7)
//!     .add_obscured("Left Arm")
//!     .with_indent(1);
//!
//! let catalog = ReportCatalog::standard();
//! assert_eq!(report.render(&catalog), "    Atlas takes 7 damage to Left Arm.");
//! assert_eq!(report.obscured().render(&catalog), "    Atlas takes 7 damage to ********.");
//! ```

pub mod codes;
pub mod filter;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, PlayerId};

pub use codes::ReportCatalog;
pub use filter::{Delivery, FilteredView, Perception};

/// Text shown in place of an obscured parameter.
pub const OBSCURED: &str = "********";

/// Spaces per indentation level.
const INDENT_WIDTH: usize = 4;

// =============================================================================
// Report
// =============================================================================

/// Who may read a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Everyone
    Public,
    /// Anyone who can perceive the subject; others get an obscured copy
    Visible,
    /// Only the subject's owner
    Hidden,
    /// Only this player
    Player(PlayerId),
}

/// A report parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamValue {
    /// Text
    Text(String),
    /// Integer
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// One substitution parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportParam {
    /// The value
    pub value: ParamValue,
    /// Hidden from observers who cannot see the subject
    pub obscured: bool,
}

/// A single report record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Report {
    /// Template id
    pub id: u16,
    /// Who may read it
    pub visibility: Visibility,
    /// Entity the report is about
    pub subject: Option<EntityId>,
    /// Parameters in template order
    pub params: Vec<ReportParam>,
    /// Indentation level
    pub indent: u8,
    /// Line breaks after the message
    pub newlines: u8,
}

impl Report {
    fn with_visibility(id: u16, visibility: Visibility, subject: Option<EntityId>) -> Self {
        Self {
            id,
            visibility,
            subject,
            params: Vec::new(),
            indent: 0,
            newlines: 1,
        }
    }

    /// A report everyone receives.
    #[must_use]
    pub fn public(id: u16) -> Self {
        Self::with_visibility(id, Visibility::Public, None)
    }

    /// A report about `subject`, obscured for observers who cannot see it.
    #[must_use]
    pub fn visible(id: u16, subject: EntityId) -> Self {
        Self::with_visibility(id, Visibility::Visible, Some(subject))
    }

    /// A report only the owner of `subject` receives.
    #[must_use]
    pub fn hidden(id: u16, subject: EntityId) -> Self {
        Self::with_visibility(id, Visibility::Hidden, Some(subject))
    }

    /// A report addressed to one player.
    #[must_use]
    pub fn player(id: u16, player: PlayerId) -> Self {
        Self::with_visibility(id, Visibility::Player(player), None)
    }

    /// Appends a parameter.
    #[must_use]
    pub fn add(mut self, value: impl Into<ParamValue>) -> Self {
        self.params.push(ReportParam {
            value: value.into(),
            obscured: false,
        });
        self
    }

    /// Appends a parameter hidden from observers who cannot see the subject.
    #[must_use]
    pub fn add_obscured(mut self, value: impl Into<ParamValue>) -> Self {
        self.params.push(ReportParam {
            value: value.into(),
            obscured: true,
        });
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: EntityId) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the indentation level.
    #[must_use]
    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the number of trailing line breaks.
    #[must_use]
    pub fn with_newlines(mut self, newlines: u8) -> Self {
        self.newlines = newlines;
        self
    }

    /// A copy with every obscured parameter replaced by [`OBSCURED`].
    #[must_use]
    pub fn obscured(&self) -> Self {
        let mut copy = self.clone();
        for param in copy.params.iter_mut().filter(|p| p.obscured) {
            param.value = ParamValue::Text(OBSCURED.to_owned());
        }
        copy
    }

    /// Renders the message text (without trailing line breaks).
    ///
    /// Parameters fill `<data>` placeholders in order. Unknown ids render as
    /// `[report <id>]`.
    #[must_use]
    pub fn render(&self, catalog: &ReportCatalog) -> String {
        let mut out = " ".repeat(usize::from(self.indent) * INDENT_WIDTH);
        let Some(template) = catalog.get(self.id) else {
            out.push_str(&format!("[report {}]", self.id));
            return out;
        };

        let mut params = self.params.iter();
        let mut rest = template;
        while let Some(pos) = rest.find(codes::PLACEHOLDER) {
            out.push_str(&rest[..pos]);
            match params.next() {
                Some(param) => out.push_str(&param.value.to_string()),
                None => out.push('?'),
            }
            rest = &rest[pos + codes::PLACEHOLDER.len()..];
        }
        out.push_str(rest);
        out
    }
}

// =============================================================================
// Report Log
// =============================================================================

/// The ordered report stream for a round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLog {
    reports: Vec<Report>,
    obscured_recipients: BTreeMap<usize, BTreeSet<PlayerId>>,
}

impl ReportLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a report and returns its index.
    pub fn push(&mut self, report: Report) -> usize {
        self.reports.push(report);
        self.reports.len() - 1
    }

    /// Appends reports in order.
    pub fn extend(&mut self, reports: impl IntoIterator<Item = Report>) {
        self.reports.extend(reports);
    }

    /// All reports in order.
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Number of reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// True if nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Notes that `player` received an obscured copy of report `index`.
    pub fn mark_obscured(&mut self, index: usize, player: PlayerId) {
        self.obscured_recipients
            .entry(index)
            .or_default()
            .insert(player);
    }

    /// Players who received an obscured copy of report `index`.
    #[must_use]
    pub fn obscured_recipients(&self, index: usize) -> Option<&BTreeSet<PlayerId>> {
        self.obscured_recipients.get(&index)
    }

    /// Drains the log, clearing the side table.
    pub fn take(&mut self) -> Vec<Report> {
        self.obscured_recipients.clear();
        std::mem::take(&mut self.reports)
    }
}
