// ── Cluster member positions ──
//
// Stack slots inside a virtual chassis, derived from member names. Members
// named `<cluster> - Switch <n>` take the switch ordinal, `- Node <n>`
// lands after the switches, anything else falls back to its alphabetical
// rank among the members. Slot 1 is reserved for the master.

use std::sync::LazyLock;

use regex::Regex;

static SWITCH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+-\s([sS]witch)\s?(?P<pos>\d+)").expect("pattern compiles"));
static NODE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+-\s([nN]ode)\s?(?P<pos>\d+)").expect("pattern compiles"));

/// What a member name says about its place in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Switch(u16),
    Node(u16),
    Unspecified,
}

pub fn classify(name: &str) -> MemberRole {
    if let Some(caps) = SWITCH_NAME.captures(name) {
        if let Ok(pos) = caps["pos"].parse() {
            return MemberRole::Switch(pos);
        }
    }
    if let Some(caps) = NODE_NAME.captures(name) {
        if let Ok(pos) = caps["pos"].parse() {
            return MemberRole::Node(pos);
        }
    }
    MemberRole::Unspecified
}

/// The stack slot for `name` among `members`. Stable across runs: the same
/// member list always yields the same slot. The caller assigns the master
/// slot 1 directly.
pub fn slot(name: &str, members: &[String]) -> u16 {
    let base = match classify(name) {
        MemberRole::Switch(pos) => pos,
        MemberRole::Node(pos) => pos.saturating_add(1),
        MemberRole::Unspecified => {
            let mut sorted: Vec<&str> = members.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            let rank = sorted.iter().position(|m| *m == name).unwrap_or(0);
            u16::try_from(rank).map_or(u16::MAX, |rank| rank.saturating_add(1))
        }
    };
    base.saturating_add(1)
}
