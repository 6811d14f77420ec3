// ── Set membership reconciliation ──
//
// Tag and VLAN collections reconcile as sets: the target ends up with
// exactly the desired members, nothing extra kept, nothing desired missed.

use std::collections::BTreeSet;

use crate::model::{Port, PortMode, VlanMembership};

/// Members to add to and remove from `current` so it equals `desired`.
pub fn set_delta<T: Ord + Clone>(current: &[T], desired: &[T]) -> (Vec<T>, Vec<T>) {
    let cur: BTreeSet<&T> = current.iter().collect();
    let des: BTreeSet<&T> = desired.iter().collect();
    let add = des.difference(&cur).map(|m| (*m).clone()).collect();
    let remove = cur.difference(&des).map(|m| (*m).clone()).collect();
    (add, remove)
}

/// How a port's VLAN memberships map onto the target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanAssignment<'a> {
    None,
    /// Access mode with exactly one membership: the untagged VLAN.
    Untagged(&'a VlanMembership),
    /// Everything else: the tagged set.
    Tagged(&'a [VlanMembership]),
}

pub fn assignment(port: &Port) -> VlanAssignment<'_> {
    match (&port.mode, port.vlans.as_slice()) {
        (_, []) => VlanAssignment::None,
        (PortMode::Access, [only]) => VlanAssignment::Untagged(only),
        (_, all) => VlanAssignment::Tagged(all),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn port(mode: PortMode, vlans: &[(&str, u16)]) -> Port {
        Port {
            device: "sw1".into(),
            name: "eth0".into(),
            mode,
            vlans: vlans
                .iter()
                .map(|(name, vid)| VlanMembership {
                    name: (*name).to_string(),
                    vid: *vid,
                })
                .collect(),
            ..Port::default()
        }
    }

    #[test]
    fn delta_covers_empty_and_partial_overlap() {
        let (add, remove) = set_delta::<&str>(&[], &["a", "b"]);
        assert_eq!((add, remove), (vec!["a", "b"], vec![]));

        let (add, remove) = set_delta(&["a", "b"], &[]);
        assert_eq!((add, remove), (vec![], vec!["a", "b"]));

        let (add, remove) = set_delta(&["a", "b"], &["b", "c"]);
        assert_eq!((add, remove), (vec!["c"], vec!["a"]));
    }

    #[test]
    fn access_port_with_one_vlan_is_untagged() {
        let p = port(PortMode::Access, &[("prod", 100)]);
        assert!(matches!(assignment(&p), VlanAssignment::Untagged(m) if m.vid == 100));
    }

    #[test]
    fn multiple_vlans_are_tagged_even_in_access_mode() {
        let p = port(PortMode::Access, &[("prod", 100), ("mgmt", 200)]);
        assert!(matches!(assignment(&p), VlanAssignment::Tagged(all) if all.len() == 2));

        let trunk = port(PortMode::Tagged, &[("prod", 100)]);
        assert!(matches!(assignment(&trunk), VlanAssignment::Tagged(_)));
    }

    #[test]
    fn no_vlans_is_no_assignment() {
        let p = port(PortMode::Tagged, &[]);
        assert_eq!(assignment(&p), VlanAssignment::None);
    }
}
