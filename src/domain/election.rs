/// Deterministic successor election for host migration.
///
/// When the host disconnects, every surviving peer runs the same election
/// over its local membership view and arrives at the same winner with no
/// communication round. Lexicographic order over the identifier strings
/// gives a total order without numeric parsing. This trades strict
/// consistency for simplicity: peers with diverging membership views can
/// disagree, which is an accepted risk rather than a consensus protocol.
use crate::domain::{MembershipTracker, PeerId};
use std::collections::BTreeSet;

/// Compute the successor host after `exclude` departs.
///
/// Candidates are the membership set minus `exclude`, plus `self_id` when
/// it is not the excluded peer. Returns the lexicographically lowest
/// candidate, or `None` when no candidate remains.
pub fn elect(exclude: &PeerId, membership: &MembershipTracker, self_id: &PeerId) -> Option<PeerId> {
    let mut candidates: BTreeSet<&PeerId> =
        membership.ids().filter(|peer| *peer != exclude).collect();

    if self_id != exclude {
        candidates.insert(self_id);
    }

    candidates.into_iter().next().cloned()
}
