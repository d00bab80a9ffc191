//! Per-observer report filtering.
//!
//! With double-blind off everything except other players' private reports
//! passes. With it on, a `Visible` report passes in full only when the
//! observer can perceive its subject and obscured otherwise, and a `Hidden`
//! report reaches only the subject's owner.
//!
//! A record that cannot be classified (non-public without a subject, or
//! player-addressed with no observer) is logged and delivered unfiltered.

use tracing::error;

use crate::entity::{EntityId, PlayerId};
use crate::error::ReportError;

use super::{Report, ReportLog, Visibility};

/// What the filter needs to know about the battlefield.
pub trait Perception {
    /// Whether `observer` can currently perceive `entity`.
    fn can_see(&self, observer: PlayerId, entity: EntityId) -> bool;

    /// Owner of `entity`, if it is known.
    fn owner(&self, entity: EntityId) -> Option<PlayerId>;
}

/// How a report reaches one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered as is
    Full,
    /// Delivered with obscured parameters masked
    Obscured,
    /// Not delivered
    Withheld,
}

/// Classifies `report` for `observer`.
///
/// `observer` is `None` for an omniscient view (replay, server log); only
/// player-addressed reports need a player context.
///
/// # Errors
///
/// Returns a [`ReportError`] when the record is malformed for filtering.
pub fn classify(
    report: &Report,
    observer: Option<PlayerId>,
    double_blind: bool,
    perception: &dyn Perception,
) -> Result<Delivery, ReportError> {
    match report.visibility {
        Visibility::Public => Ok(Delivery::Full),
        Visibility::Player(addressee) => {
            let observer = observer.ok_or(ReportError::MissingPlayerContext { id: report.id })?;
            Ok(if observer == addressee {
                Delivery::Full
            } else {
                Delivery::Withheld
            })
        }
        Visibility::Visible | Visibility::Hidden if !double_blind => Ok(Delivery::Full),
        Visibility::Visible | Visibility::Hidden => {
            let subject = report
                .subject
                .ok_or(ReportError::MissingSubject { id: report.id })?;
            let Some(observer) = observer else {
                return Ok(Delivery::Full);
            };
            if report.visibility == Visibility::Hidden {
                return Ok(if perception.owner(subject) == Some(observer) {
                    Delivery::Full
                } else {
                    Delivery::Withheld
                });
            }
            Ok(if perception.can_see(observer, subject) {
                Delivery::Full
            } else {
                Delivery::Obscured
            })
        }
    }
}

/// One observer's copy of the report log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    /// Reports the observer receives, in log order
    pub reports: Vec<Report>,
    /// Log indices of the reports delivered obscured
    pub obscured: Vec<usize>,
}

impl ReportLog {
    /// Builds the view of this log that `observer` receives.
    ///
    /// The stored records are untouched; the view holds copies.
    #[must_use]
    pub fn filter_for(
        &self,
        observer: Option<PlayerId>,
        double_blind: bool,
        perception: &dyn Perception,
    ) -> FilteredView {
        let mut view = FilteredView::default();
        for (index, report) in self.reports().iter().enumerate() {
            let delivery = classify(report, observer, double_blind, perception).unwrap_or_else(|e| {
                error!(
                    target: "hexbrawl::report",
                    error = %e,
                    severity = e.severity().as_str(),
                    report = report.id,
                    "report failed consistency check; delivering unfiltered"
                );
                Delivery::Full
            });
            match delivery {
                Delivery::Full => view.reports.push(report.clone()),
                Delivery::Obscured => {
                    view.reports.push(report.obscured());
                    view.obscured.push(index);
                }
                Delivery::Withheld => {}
            }
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{codes, ParamValue, OBSCURED};
    use std::collections::BTreeMap;

    struct Fixed {
        owners: BTreeMap<EntityId, PlayerId>,
        sees_all: bool,
    }

    impl Perception for Fixed {
        fn can_see(&self, observer: PlayerId, entity: EntityId) -> bool {
            self.sees_all || self.owners.get(&entity) == Some(&observer)
        }

        fn owner(&self, entity: EntityId) -> Option<PlayerId> {
            self.owners.get(&entity).copied()
        }
    }

    fn perception(sees_all: bool) -> Fixed {
        let mut owners = BTreeMap::new();
        owners.insert(EntityId::new(1), PlayerId::new(1));
        owners.insert(EntityId::new(2), PlayerId::new(2));
        Fixed { owners, sees_all }
    }

    fn sample_log() -> ReportLog {
        let mut log = ReportLog::new();
        log.push(Report::public(codes::ATTACK_HEADER).add("Atlas"));
        log.push(Report::visible(codes::DAMAGE, EntityId::new(2)).add("Locust").add_obscured(5));
        log.push(Report::hidden(codes::CRITICAL_HIT, EntityId::new(2)).add("Locust"));
        log
    }

    mod classify_tests {
        use super::*;

        #[test]
        fn player_reports_go_to_their_player_only() {
            let report = Report::player(codes::PSR_ROLL, PlayerId::new(1));
            let p = perception(true);
            assert_eq!(classify(&report, Some(PlayerId::new(1)), false, &p), Ok(Delivery::Full));
            assert_eq!(
                classify(&report, Some(PlayerId::new(2)), false, &p),
                Ok(Delivery::Withheld)
            );
        }

        #[test]
        fn missing_subject_is_a_consistency_error() {
            let mut report = Report::visible(codes::DAMAGE, EntityId::new(1));
            report.subject = None;
            let err = classify(&report, Some(PlayerId::new(1)), true, &perception(false));
            assert_eq!(err, Err(ReportError::MissingSubject { id: codes::DAMAGE }));
        }

        #[test]
        fn player_report_without_context_is_an_error() {
            let report = Report::player(codes::PSR_ROLL, PlayerId::new(1));
            assert!(classify(&report, None, false, &perception(true)).is_err());
        }
    }

    mod view_tests {
        use super::*;

        #[test]
        fn no_double_blind_and_full_sight_is_identity() {
            let log = sample_log();
            let view = log.filter_for(Some(PlayerId::new(1)), false, &perception(true));
            assert_eq!(view.reports, log.reports());
            assert!(view.obscured.is_empty());
        }

        #[test]
        fn double_blind_obscures_and_withholds() {
            let log = sample_log();
            let view = log.filter_for(Some(PlayerId::new(1)), true, &perception(false));
            assert_eq!(view.reports.len(), 2);
            assert_eq!(view.reports[1].params[1].value, ParamValue::Text(OBSCURED.into()));
            assert_eq!(view.obscured, vec![1]);
            // stored record unchanged
            assert_eq!(log.reports()[1].params[1].value, ParamValue::Int(5));
        }

        #[test]
        fn owner_receives_hidden_reports() {
            let log = sample_log();
            let view = log.filter_for(Some(PlayerId::new(2)), true, &perception(false));
            assert_eq!(view.reports, log.reports());
        }

        #[test]
        fn malformed_record_passes_unfiltered() {
            let mut log = ReportLog::new();
            let mut report = Report::hidden(codes::CRITICAL_HIT, EntityId::new(2));
            report.subject = None;
            log.push(report);
            let view = log.filter_for(Some(PlayerId::new(1)), true, &perception(false));
            assert_eq!(view.reports.len(), 1);
        }
    }
}
