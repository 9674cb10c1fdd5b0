//! Lifecycle of a single queue entry.
//!
//! ```text
//! waiting ──startLoading──▶ loading ──markLoaded──▶ loaded
//!    │  ╲                      │
//!    │   requestSpecial        knockOff
//!    │      ╲                  ▼
//!    │       ▶ special ──▶ knocked_off
//!    └──────knockOff──────────▲
//! ```
//!
//! `special` skips loading: it is either marked loaded directly or knocked
//! off. `loaded` and `knocked_off` are terminal.

use chrono::{DateTime, Local};
use model::queue::{QueueEntry, QueueStatus};

use crate::{RequestError, RequestResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartLoading,
    MarkLoaded,
    KnockOff { reason: String },
    RequestSpecial,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartLoading => "startLoading",
            Self::MarkLoaded => "markLoaded",
            Self::KnockOff { .. } => "knockOff",
            Self::RequestSpecial => "requestSpecial",
        }
    }

    pub fn target(&self) -> QueueStatus {
        match self {
            Self::StartLoading => QueueStatus::Loading,
            Self::MarkLoaded => QueueStatus::Loaded,
            Self::KnockOff { .. } => QueueStatus::KnockedOff,
            Self::RequestSpecial => QueueStatus::Special,
        }
    }

    /// Maps a requested target status onto the action that reaches it. There
    /// is no way back to `waiting`.
    pub fn from_target_status(
        status: QueueStatus,
        reason: Option<String>,
    ) -> RequestResult<Self> {
        match status {
            QueueStatus::Loading => Ok(Self::StartLoading),
            QueueStatus::Loaded => Ok(Self::MarkLoaded),
            QueueStatus::KnockedOff => Ok(Self::KnockOff {
                reason: reason.unwrap_or_default(),
            }),
            QueueStatus::Special => Ok(Self::RequestSpecial),
            QueueStatus::Waiting => Err(RequestError::invalid(
                "An entry can not be put back to `waiting`.",
            )),
        }
    }
}

/// How the acting user relates to the entry being changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relation {
    /// Coordinator of the entry's station.
    pub coordinator: bool,
    /// Driver who owns the entry.
    pub owner: bool,
}

impl Relation {
    pub fn permits(&self, action: &Action) -> bool {
        match action {
            Action::RequestSpecial => self.coordinator || self.owner,
            Action::StartLoading | Action::MarkLoaded | Action::KnockOff { .. } => {
                self.coordinator
            }
        }
    }
}

pub fn next_status(from: QueueStatus, action: &Action) -> Option<QueueStatus> {
    use QueueStatus::*;

    match (from, action) {
        (Waiting, Action::StartLoading) => Some(Loading),
        (Loading | Special, Action::MarkLoaded) => Some(Loaded),
        (Waiting | Loading | Special, Action::KnockOff { .. }) => Some(KnockedOff),
        (Waiting, Action::RequestSpecial) => Some(Special),
        _ => None,
    }
}

/// Checks the authority of the actor and applies the action to the entry,
/// stamping the time of the transition. The entry is left untouched on error.
///
/// Leaving `waiting` clears the position. Closing the gap behind it is up to
/// the caller.
pub fn apply(
    entry: &mut QueueEntry,
    action: Action,
    relation: Relation,
    now: DateTime<Local>,
) -> RequestResult<()> {
    if !relation.permits(&action) {
        return Err(RequestError::unauthorized(format!(
            "You are not allowed to {} this entry.",
            action.name()
        )));
    }

    let status = next_status(entry.status, &action).ok_or_else(|| {
        RequestError::IllegalTransition {
            from: entry.status,
            attempted: action.target().to_string(),
        }
    })?;

    match action {
        Action::StartLoading => {
            entry.loading_start_time = Some(now);
        }
        Action::MarkLoaded => {
            entry.loading_end_time = Some(now);
            entry.departure_time = Some(now);
        }
        Action::KnockOff { reason } => {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(RequestError::invalid(
                    "A reason is required to knock off a vehicle.",
                ));
            }
            entry.knock_off_time = Some(now);
            entry.knock_off_reason = Some(reason.to_owned());
        }
        Action::RequestSpecial => {
            entry.special_request = true;
            entry.special_request_time = Some(now);
        }
    }

    entry.status = status;
    if status != QueueStatus::Waiting {
        entry.position = None;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use model::ExampleData;

    use super::*;

    const COORDINATOR: Relation = Relation {
        coordinator: true,
        owner: false,
    };

    const OWNER: Relation = Relation {
        coordinator: false,
        owner: true,
    };

    fn entry(status: QueueStatus) -> QueueEntry {
        let mut entry = QueueEntry::example_data();
        entry.status = status;
        entry.position = (status == QueueStatus::Waiting).then_some(1);
        entry
    }

    fn knock_off() -> Action {
        Action::KnockOff {
            reason: "breakdown".to_owned(),
        }
    }

    #[test]
    fn transition_table() {
        use QueueStatus::*;

        let actions = [
            Action::StartLoading,
            Action::MarkLoaded,
            knock_off(),
            Action::RequestSpecial,
        ];
        let expected = [
            (Waiting, [Some(Loading), None, Some(KnockedOff), Some(Special)]),
            (Loading, [None, Some(Loaded), Some(KnockedOff), None]),
            (Special, [None, Some(Loaded), Some(KnockedOff), None]),
            (Loaded, [None, None, None, None]),
            (KnockedOff, [None, None, None, None]),
        ];
        for (from, targets) in expected {
            for (action, target) in actions.iter().zip(targets) {
                assert_eq!(next_status(from, action), target, "{} {:?}", from, action);
            }
        }
    }

    #[test]
    fn loading_then_loaded_stamps_times() {
        let now = Local::now();
        let mut entry = entry(QueueStatus::Waiting);

        apply(&mut entry, Action::StartLoading, COORDINATOR, now).unwrap();
        assert_eq!(entry.status, QueueStatus::Loading);
        assert_eq!(entry.position, None);
        assert_eq!(entry.loading_start_time, Some(now));

        apply(&mut entry, Action::MarkLoaded, COORDINATOR, now).unwrap();
        assert_eq!(entry.status, QueueStatus::Loaded);
        assert_eq!(entry.loading_end_time, Some(now));
        assert_eq!(entry.departure_time, Some(now));
    }

    #[test]
    fn terminal_entries_refuse_everything() {
        let mut entry = entry(QueueStatus::Loaded);
        let result = apply(&mut entry, Action::StartLoading, COORDINATOR, Local::now());
        match result {
            Err(RequestError::IllegalTransition { from, attempted }) => {
                assert_eq!(from, QueueStatus::Loaded);
                assert_eq!(attempted, "loading");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(entry.status, QueueStatus::Loaded);
    }

    #[test]
    fn knock_off_requires_a_reason() {
        let mut entry = entry(QueueStatus::Waiting);
        let blank = Action::KnockOff {
            reason: "  ".to_owned(),
        };
        let result = apply(&mut entry, blank, COORDINATOR, Local::now());
        assert!(matches!(result, Err(RequestError::Invalid(_))));
        assert_eq!(entry.status, QueueStatus::Waiting);
        assert_eq!(entry.position, Some(1));

        apply(&mut entry, knock_off(), COORDINATOR, Local::now()).unwrap();
        assert_eq!(entry.status, QueueStatus::KnockedOff);
        assert_eq!(entry.knock_off_reason.as_deref(), Some("breakdown"));
        assert!(entry.knock_off_time.is_some());
    }

    #[test]
    fn drivers_may_only_request_special() {
        let mut entry = entry(QueueStatus::Waiting);
        let result = apply(&mut entry, Action::StartLoading, OWNER, Local::now());
        assert!(matches!(result, Err(RequestError::Unauthorized(_))));

        apply(&mut entry, Action::RequestSpecial, OWNER, Local::now()).unwrap();
        assert_eq!(entry.status, QueueStatus::Special);
        assert!(entry.special_request);
        assert!(entry.special_request_time.is_some());

        let stranger = Relation::default();
        let result = apply(&mut entry, knock_off(), stranger, Local::now());
        assert!(matches!(result, Err(RequestError::Unauthorized(_))));
    }

    #[test]
    fn special_twice_is_illegal() {
        let mut entry = entry(QueueStatus::Special);
        let result = apply(&mut entry, Action::RequestSpecial, OWNER, Local::now());
        assert!(matches!(
            result,
            Err(RequestError::IllegalTransition {
                from: QueueStatus::Special,
                ..
            })
        ));
    }

    #[test]
    fn target_status_maps_to_actions() {
        assert_eq!(
            Action::from_target_status(QueueStatus::Loading, None).unwrap(),
            Action::StartLoading
        );
        assert_eq!(
            Action::from_target_status(QueueStatus::KnockedOff, Some("late".into())).unwrap(),
            Action::KnockOff {
                reason: "late".to_owned()
            }
        );
        assert!(Action::from_target_status(QueueStatus::Waiting, None).is_err());
    }
}
