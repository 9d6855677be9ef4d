//! Category to support-team routing table.

pub const HARDWARE_ISSUE: &str = "hardware issue";
pub const SOFTWARE_BUG: &str = "software bug";
pub const PASSWORD_RESET: &str = "password reset";

/// Team for any category outside the routing table.
pub const DEFAULT_TEAM: &str = "General IT Team";

pub const CATEGORY_TO_TEAM: [(&str, &str); 3] = [
    (HARDWARE_ISSUE, "Hardware Support Team"),
    (SOFTWARE_BUG, "Software Engineering Team"),
    (PASSWORD_RESET, "IT Support Desk"),
];

pub fn assign_team(category: &str) -> &'static str {
    CATEGORY_TO_TEAM
        .iter()
        .find(|(known, _)| *known == category)
        .map(|(_, team)| *team)
        .unwrap_or(DEFAULT_TEAM)
}
