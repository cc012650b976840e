//! Bilingual (uz/ru) message templates and inline-keyboard builders.
//!
//! Every user-facing string carries both languages in one message, so
//! delivery never depends on knowing the recipient's locale. Role and
//! priority display names come from `fiberdesk_core::i18n`.

use fiberdesk_core::i18n::{priority_name, role_name, workflow_name, Lang};
use fiberdesk_core::roles::Role;
use fiberdesk_core::types::{DbId, Timestamp};
use fiberdesk_db::models::service_request::ServiceRequest;

use crate::delivery::InlineButton;

/// Maximum description length shown in summaries before truncation.
const DESCRIPTION_PREVIEW_CHARS: usize = 60;

/// Callback payload of the "view my assignments" button.
pub const CB_VIEW_ASSIGNMENTS: &str = "view_assignments";

/// Callback payload of the assignment-view refresh button.
pub const CB_REFRESH_ASSIGNMENTS: &str = "refresh_assignments";

/// Callback payload prefix of a per-request action button.
pub const CB_OPEN_REQUEST_PREFIX: &str = "open_request:";

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Truncate a description to the preview length, appending an ellipsis.
/// Counts characters, not bytes, so multibyte Cyrillic text is safe.
pub fn truncate_description(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Chat-friendly timestamp, e.g. `14.03.2026 09:15`.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.format("%d.%m.%Y %H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Assignment notifications
// ---------------------------------------------------------------------------

/// Summary sent to each member of the newly responsible role.
pub fn assignment_summary(request: &ServiceRequest) -> String {
    format!(
        "\u{1F514} Yangi ariza / Новая заявка\n\
         {uz_wf} / {ru_wf}\n\n\
         #{id}: {desc}\n\
         {glyph} {uz_prio} / {ru_prio}\n\
         {created}",
        uz_wf = workflow_name(request.workflow_type, Lang::Uz),
        ru_wf = workflow_name(request.workflow_type, Lang::Ru),
        id = request.id,
        desc = truncate_description(&request.description),
        glyph = request.priority.glyph(),
        uz_prio = priority_name(request.priority, Lang::Uz),
        ru_prio = priority_name(request.priority, Lang::Ru),
        created = format_timestamp(request.created_at),
    )
}

/// Summary variant for requests a staff member opened on a client's
/// behalf; carries the creator's role in both languages.
pub fn staff_created_assignment(request: &ServiceRequest, creator_role: Role) -> String {
    format!(
        "{base}\n\n\
         Yaratdi: {uz_role} / Создал: {ru_role}",
        base = assignment_summary(request),
        uz_role = role_name(creator_role, Lang::Uz),
        ru_role = role_name(creator_role, Lang::Ru),
    )
}

/// One line of the aggregated assignment view.
fn assignment_line(request: &ServiceRequest) -> String {
    let mut line = format!(
        "{glyph} #{id}: {desc} ({date})",
        glyph = request.priority.glyph(),
        id = request.id,
        desc = truncate_description(&request.description),
        date = format_timestamp(request.created_at),
    );
    if let Some(location) = &request.location {
        line.push_str(&format!(" \u{2014} {location}"));
    }
    line
}

/// The aggregated "my assignments" view: one line per open request.
pub fn assignment_view(requests: &[ServiceRequest]) -> String {
    let mut text = format!(
        "\u{1F4CB} Sizning arizalaringiz / Ваши заявки ({})\n",
        requests.len()
    );
    for request in requests {
        text.push('\n');
        text.push_str(&assignment_line(request));
    }
    text
}

/// Shown when the user has no open assignments.
pub fn nothing_pending() -> String {
    "\u{2705} Yangi arizalar yo'q / Новых заявок нет".to_string()
}

// ---------------------------------------------------------------------------
// Staff-created request notices
// ---------------------------------------------------------------------------

/// Notice to the client that a staff member opened a request for them.
pub fn staff_created_client_notice(request: &ServiceRequest, creator_role: Role) -> String {
    format!(
        "{uz_role} sizning nomingizdan ariza yaratdi / \
         {ru_role} создал заявку от вашего имени\n\n\
         #{id}: {desc}\n\
         {uz_wf} / {ru_wf}",
        uz_role = role_name(creator_role, Lang::Uz),
        ru_role = role_name(creator_role, Lang::Ru),
        id = request.id,
        desc = truncate_description(&request.description),
        uz_wf = workflow_name(request.workflow_type, Lang::Uz),
        ru_wf = workflow_name(request.workflow_type, Lang::Ru),
    )
}

/// Confirmation to the staff member who created the request.
pub fn staff_created_confirmation(request: &ServiceRequest) -> String {
    format!(
        "\u{2705} Ariza yaratildi / Заявка создана\n\n\
         #{id}: {desc}\n\
         {glyph} {uz_prio} / {ru_prio}",
        id = request.id,
        desc = truncate_description(&request.description),
        glyph = request.priority.glyph(),
        uz_prio = priority_name(request.priority, Lang::Uz),
        ru_prio = priority_name(request.priority, Lang::Ru),
    )
}

// ---------------------------------------------------------------------------
// Keyboards
// ---------------------------------------------------------------------------

/// The single button attached to an assignment notification.
pub fn view_assignments_button() -> InlineButton {
    InlineButton::new(
        "\u{1F4CB} Arizalarim / Мои заявки",
        CB_VIEW_ASSIGNMENTS,
    )
}

/// Per-request action button in the aggregated view.
pub fn open_request_button(request_id: DbId) -> InlineButton {
    InlineButton::new(
        format!("#{request_id}"),
        format!("{CB_OPEN_REQUEST_PREFIX}{request_id}"),
    )
}

/// Refresh button closing the aggregated view keyboard.
pub fn refresh_button() -> InlineButton {
    InlineButton::new(
        "\u{1F504} Yangilash / Обновить",
        CB_REFRESH_ASSIGNMENTS,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
