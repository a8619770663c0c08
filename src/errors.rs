use thiserror::Error;

use crate::decimal::Money;
use crate::types::{ClassId, ObligationId, PlanId, ReferenceKind, StudentId};

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("{kind} not found in tenant scope: {key}")]
    ReferenceNotFound {
        kind: ReferenceKind,
        key: String,
    },

    #[error("no obligation for student {student_id} matching {reference}")]
    ObligationNotFound {
        student_id: StudentId,
        reference: String,
    },

    #[error("unsupported payment interval: {months} months")]
    UnsupportedInterval {
        months: i32,
    },

    #[error("a student with contact number {number} already exists")]
    DuplicateContact {
        number: String,
    },

    #[error("class name already taken: {name}")]
    DuplicateClassName {
        name: String,
    },

    #[error("invalid obligation state: {message}")]
    InvalidObligationState {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("class {class_id} still has enrolled students")]
    ClassNotEmpty {
        class_id: ClassId,
    },

    #[error("student {student_id} still has open obligations")]
    StudentHasObligations {
        student_id: StudentId,
    },

    #[error("payment plan {plan_id} is still referenced by fees")]
    PlanInUse {
        plan_id: PlanId,
    },

    #[error("identifier space exhausted for {scope}")]
    IdentifierExhausted {
        scope: String,
    },

    #[error("stale obligation write: {id}")]
    StaleObligation {
        id: ObligationId,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, FeeError>;
