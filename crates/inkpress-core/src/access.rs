//! Access decision logic for gated file downloads.
//!
//! `evaluate_access` is a pure function over a snapshot of the registry and
//! ledger state. It never touches the database and never mutates anything;
//! callers assemble the snapshot, act on the outcome, and own all side
//! effects (counter increments, ledger inserts).

/// Outcome of an access evaluation. Every case is an expected branch of
/// normal operation, so refusals are outcomes rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The file row or its binary does not resolve.
    NotFound,
    /// The download may proceed immediately.
    Allowed,
    /// The requester already holds a pending request for this file.
    PendingExists,
    /// The requester must create a download request before retrying.
    RequestRequired,
}

/// The requester's ledger history for one file, collapsed to what the
/// decision needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerView {
    pub has_approved: bool,
    pub has_pending: bool,
}

/// Snapshot of the state relevant to one download attempt.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest {
    pub is_admin: bool,
    /// The registry row exists.
    pub file_exists: bool,
    /// The binary resolved on disk (registered key or fallback location).
    pub binary_available: bool,
    pub ledger: LedgerView,
}

/// Decide whether a download proceeds, evaluated in order; first match wins:
/// missing file or binary, admin bypass, approved request, pending request,
/// then request-required. A rejected history row neither grants access nor
/// blocks a new request.
pub fn evaluate_access(request: &AccessRequest) -> AccessOutcome {
    if !request.file_exists || !request.binary_available {
        return AccessOutcome::NotFound;
    }
    if request.is_admin {
        return AccessOutcome::Allowed;
    }
    if request.ledger.has_approved {
        return AccessOutcome::Allowed;
    }
    if request.ledger.has_pending {
        return AccessOutcome::PendingExists;
    }
    AccessOutcome::RequestRequired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(is_admin: bool, ledger: LedgerView) -> AccessRequest {
        AccessRequest {
            is_admin,
            file_exists: true,
            binary_available: true,
            ledger,
        }
    }

    #[test]
    fn test_missing_file_is_not_found_for_everyone() {
        for is_admin in [false, true] {
            let req = AccessRequest {
                is_admin,
                file_exists: false,
                binary_available: false,
                ledger: LedgerView::default(),
            };
            assert_eq!(evaluate_access(&req), AccessOutcome::NotFound);
        }
    }

    #[test]
    fn test_missing_binary_is_not_found_even_for_admin() {
        let req = AccessRequest {
            is_admin: true,
            file_exists: true,
            binary_available: false,
            ledger: LedgerView::default(),
        };
        assert_eq!(evaluate_access(&req), AccessOutcome::NotFound);
    }

    #[test]
    fn test_admin_bypasses_ledger_state() {
        // Admins are allowed regardless of any ledger history
        for has_approved in [false, true] {
            for has_pending in [false, true] {
                let req = request(
                    true,
                    LedgerView {
                        has_approved,
                        has_pending,
                    },
                );
                assert_eq!(evaluate_access(&req), AccessOutcome::Allowed);
            }
        }
    }

    #[test]
    fn test_approved_request_grants_access() {
        let req = request(
            false,
            LedgerView {
                has_approved: true,
                has_pending: false,
            },
        );
        assert_eq!(evaluate_access(&req), AccessOutcome::Allowed);
    }

    #[test]
    fn test_approved_wins_over_pending() {
        // A newer pending request does not revoke an earlier approval
        let req = request(
            false,
            LedgerView {
                has_approved: true,
                has_pending: true,
            },
        );
        assert_eq!(evaluate_access(&req), AccessOutcome::Allowed);
    }

    #[test]
    fn test_pending_request_blocks_duplicate() {
        let req = request(
            false,
            LedgerView {
                has_approved: false,
                has_pending: true,
            },
        );
        assert_eq!(evaluate_access(&req), AccessOutcome::PendingExists);
    }

    #[test]
    fn test_no_history_requires_request() {
        let req = request(false, LedgerView::default());
        assert_eq!(evaluate_access(&req), AccessOutcome::RequestRequired);
    }

    #[test]
    fn test_rejection_allows_re_request() {
        // A rejected history row is invisible to the ledger view, so the
        // outcome is the same as having no history at all.
        let req = request(false, LedgerView::default());
        assert_eq!(evaluate_access(&req), AccessOutcome::RequestRequired);
        assert_ne!(evaluate_access(&req), AccessOutcome::Allowed);
    }
}
