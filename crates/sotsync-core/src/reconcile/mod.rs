// ── Attribute reconcilers ──
//
// Pure helpers for the attributes whose desired value is computed rather
// than copied: stack slots, VLAN membership sets, and DNS-derived primary
// addresses. Each is deterministic given the same inputs.

pub mod membership;
pub mod position;
pub mod primary_ip;
