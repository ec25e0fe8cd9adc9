//! Team composition rules
//!
//! A roster always holds exactly one leader (the initiating student) plus up
//! to [`MAX_TEAMMATES`] teammates. These functions are pure; the project
//! repository applies their output inside the creation transaction.

use uuid::Uuid;

use crate::error::ApiError;

/// Maximum number of non-leader members on a project
pub const MAX_TEAMMATES: usize = 4;

/// One row of a project roster before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub student_id: Uuid,
    pub is_leader: bool,
}

/// Build the full roster for a new project
///
/// Candidates are deduplicated by id and the initiator is silently dropped
/// from the candidate list; the initiator always occupies the leader slot,
/// never a teammate slot. Fails if more than [`MAX_TEAMMATES`] distinct
/// teammates remain.
pub fn build_roster(initiator: Uuid, candidates: &[Uuid]) -> Result<Vec<RosterEntry>, ApiError> {
    let mut teammates: Vec<Uuid> = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        if candidate == initiator || teammates.contains(&candidate) {
            continue;
        }
        teammates.push(candidate);
    }

    if teammates.len() > MAX_TEAMMATES {
        return Err(ApiError::InvalidArgument(format!(
            "a project allows at most {} teammates, got {}",
            MAX_TEAMMATES,
            teammates.len()
        )));
    }

    let mut roster = Vec::with_capacity(teammates.len() + 1);
    roster.push(RosterEntry {
        student_id: initiator,
        is_leader: true,
    });
    roster.extend(teammates.into_iter().map(|student_id| RosterEntry {
        student_id,
        is_leader: false,
    }));

    Ok(roster)
}

/// Guard for adding one more teammate to an existing roster
///
/// `current_teammates` counts non-leader members only.
pub fn check_capacity(current_teammates: usize) -> Result<(), ApiError> {
    if current_teammates >= MAX_TEAMMATES {
        return Err(ApiError::CapacityExceeded);
    }
    Ok(())
}
