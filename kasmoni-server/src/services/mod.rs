//! Service layer
//!
//! Every entry point takes the session context
//! ([`CurrentUser`](crate::auth::CurrentUser)) explicitly; calculations that
//! depend on the current month take `now: YearMonth`.
//!
//! - [`member_status`] - member status aggregation (single and bulk)
//! - [`members`] - member CRUD (writes are admin only)
//! - [`csv_transfer`] - member CSV import and export
//! - [`groups`] - savings groups and their slots
//! - [`payments`] - payment records and status transitions
//! - [`analytics`] - dashboard figures

pub mod analytics;
pub mod csv_transfer;
pub mod groups;
pub mod member_status;
pub mod members;
pub mod payments;

use crate::auth::CurrentUser;
use crate::security_log;
use crate::utils::AppError;

/// Fail with `AdminRequired` unless the caller is an admin
///
/// Called before any repository access so a refused call mutates nothing.
pub(crate) fn ensure_admin(ctx: &CurrentUser, action: &str) -> Result<(), AppError> {
    if ctx.is_admin() {
        return Ok(());
    }
    security_log!(
        "WARN",
        "admin_required",
        user_id = ctx.id,
        user_role = ctx.role.as_str(),
        action = action
    );
    Err(AppError::admin_required(action))
}

/// Fail with `PermissionDenied` unless the caller may see the member's data
pub(crate) fn ensure_can_view_member(ctx: &CurrentUser, member_id: i64) -> Result<(), AppError> {
    if ctx.can_view_member(member_id) {
        return Ok(());
    }
    security_log!(
        "WARN",
        "member_access_denied",
        user_id = ctx.id,
        member_id = member_id
    );
    Err(AppError::permission_denied(
        "You can only view your own member records",
    ))
}
