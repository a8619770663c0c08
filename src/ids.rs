use crate::config::EngineConfig;
use crate::errors::{FeeError, Result};
use crate::types::{ClassId, StudentId, TenantId};

/// highest 3-digit sequence a student identifier can carry
pub const STUDENT_SEQ_MAX: u32 = 999;

/// widest tenant component the fixed-width layout can carry
pub const TENANT_MAX: TenantId = 999;

/// 2-digit sequence component of a class identifier
pub fn class_sequence(class_id: ClassId) -> i32 {
    class_id % 100
}

/// format parts into the fixed 12-character student identifier
pub fn format_student_id(
    config: &EngineConfig,
    tenant_id: TenantId,
    class_id: ClassId,
    sequence: u32,
) -> StudentId {
    StudentId::new(format!(
        "{}{:03}{:02}{:03}",
        config.student_id_prefix,
        tenant_id,
        class_sequence(class_id),
        sequence
    ))
}

/// next student identifier in a (tenant, class) scope, derived from the
/// greatest identifier already present in that scope
///
/// an unparseable trailing sequence restarts at 1 rather than failing;
/// identifiers imported from outside the generator carry arbitrary suffixes
pub fn next_student_id(
    config: &EngineConfig,
    tenant_id: TenantId,
    class_id: ClassId,
    max_existing: Option<&StudentId>,
) -> Result<StudentId> {
    // a tenant outside 3 digits would widen the layout past 12 characters
    if !(0..=TENANT_MAX).contains(&tenant_id) {
        return Err(FeeError::IdentifierExhausted {
            scope: format!("tenant {tenant_id} outside the 3-digit range"),
        });
    }

    let next = match max_existing.and_then(StudentId::sequence) {
        Some(seq) => seq + 1,
        None => 1,
    };

    if next > STUDENT_SEQ_MAX {
        return Err(FeeError::IdentifierExhausted {
            scope: format!("tenant {tenant_id} class {class_id}"),
        });
    }

    Ok(format_student_id(config, tenant_id, class_id, next))
}

/// next class identifier within a tenant: the first class seeds the tenant's
/// block at {tenant}01, later ones increment the current maximum
pub fn next_class_id(tenant_id: TenantId, max_existing: Option<ClassId>) -> Result<ClassId> {
    let next = match max_existing {
        Some(id) => id + 1,
        None => tenant_id * 100 + 1,
    };

    // incrementing past sequence 99 would cross into the next tenant's block
    if next / 100 != tenant_id {
        return Err(FeeError::IdentifierExhausted {
            scope: format!("tenant {tenant_id} classes"),
        });
    }

    Ok(next)
}
