use uuid::Uuid;

use crate::models::Review;

/// Produce a fresh review identifier.
///
/// Random 128-bit UUIDs make collisions negligible across the process
/// lifetime and across restarts.
pub fn assign() -> Uuid {
    Uuid::new_v4()
}

/// Assign identifiers to legacy records that lack one, in collection order.
///
/// A nil id marks a record written before identifiers existed. Returns
/// whether anything changed so the caller knows to persist immediately;
/// identifiers must be stable across the next restart.
pub fn backfill(reviews: &mut [Review]) -> bool {
    let mut changed = false;
    for review in reviews.iter_mut().filter(|r| r.id.is_nil()) {
        review.id = assign();
        changed = true;
    }
    changed
}
