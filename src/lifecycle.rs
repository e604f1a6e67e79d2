//! Case lifecycle engine.
//!
//! Governs every mutation of a fraud case: creation, assignment, status
//! transitions and note appends. All writes to a single case go through the
//! store's per-case entry lock, so concurrent calls observe one total order.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::Actor;
use crate::error::FraudError;
use crate::store::Store;
use crate::types::case::{CaseNote, CaseStatus, FraudCase, NewCase};

pub struct CaseLifecycleEngine {
    store: Arc<Store>,
}

impl CaseLifecycleEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Open a case for an existing transaction.
    pub fn create_case(&self, input: NewCase, actor: &Actor) -> Result<FraudCase, FraudError> {
        let transaction = self.store.transaction(input.transaction_id)?;
        let case = FraudCase::new(input, &transaction, Some(actor.id.clone()), Utc::now())?;
        info!(
            case_number = %case.case_number,
            transaction_reference = %case.transaction_reference,
            created_by = %actor.id,
            "Fraud case created"
        );
        self.store.insert_case(case.clone());
        Ok(case)
    }

    /// Assign the case to an analyst. Moves a PENDING case into
    /// INVESTIGATING; fails with `CaseAlreadyClosed` on terminal cases.
    pub fn assign(&self, case_id: Uuid, user_id: String) -> Result<FraudCase, FraudError> {
        let updated = self.store.with_case_mut(case_id, |case| {
            if case.status.is_terminal() {
                return Err(FraudError::CaseAlreadyClosed);
            }
            case.assigned_to = Some(user_id.clone());
            if case.status == CaseStatus::Pending {
                case.status = CaseStatus::Investigating;
            }
            case.updated_at = Utc::now();
            Ok(())
        })?;
        info!(
            case_number = %updated.case_number,
            assigned_to = %user_id,
            status = %updated.status,
            "Case assigned"
        );
        Ok(updated)
    }

    /// Change the case status following the transition table.
    ///
    /// Entering a terminal status stores the resolution notes and sets
    /// `resolved_at` exactly once. `updated_at` is bumped on every
    /// successful call, even when the status did not change.
    pub fn update_status(
        &self,
        case_id: Uuid,
        new_status: CaseStatus,
        resolution_notes: Option<String>,
    ) -> Result<FraudCase, FraudError> {
        let updated = self.store.with_case_mut(case_id, |case| {
            if case.status.is_terminal() {
                return Err(FraudError::CaseAlreadyClosed);
            }
            if !case.status.can_transition_to(new_status) {
                return Err(FraudError::IllegalTransition {
                    from: case.status,
                    to: new_status,
                });
            }

            let now = Utc::now();
            case.status = new_status;
            if new_status.is_terminal() {
                // The source state was non-terminal, so this is the first
                // and only write to resolved_at.
                debug_assert!(case.resolved_at.is_none());
                case.resolved_at = Some(now);
                if let Some(notes) = resolution_notes.as_ref() {
                    case.resolution_notes = Some(notes.clone());
                }
            }
            case.updated_at = now;
            Ok(())
        })?;
        info!(
            case_number = %updated.case_number,
            status = %updated.status,
            "Case status updated"
        );
        Ok(updated)
    }

    /// Append an investigation note. Legal in any state, including terminal
    /// ones: the investigation history stays open after closure.
    pub fn add_note(
        &self,
        case_id: Uuid,
        actor: &Actor,
        note: String,
        is_internal: bool,
    ) -> Result<CaseNote, FraudError> {
        if note.trim().is_empty() {
            return Err(FraudError::EmptyNote);
        }

        let entry = CaseNote {
            id: Uuid::new_v4(),
            author: actor.id.clone(),
            note,
            is_internal,
            created_at: Utc::now(),
        };
        let appended = entry.clone();

        self.store.with_case_mut(case_id, move |case| {
            case.notes.push(entry);
            Ok(())
        })?;

        Ok(appended)
    }
}
