//! Work Selector: decides which pending candidates a run attempts.

use crate::types::{candidate::Candidate, candidate::Tracked, config::SelectorPolicy};

/// Apply a selector policy to candidates in enumeration order.
///
/// - `FullSweep`: every pending candidate.
/// - `SingleGroup`: the first pending candidate fixes `(group, slot)`; from
///   there on, pending candidates in the same bucket are taken until the first
///   candidate (pending or not) from a different group.
///
/// An empty result is a valid outcome, not an error.
pub fn select(tracked: Vec<Tracked>, policy: SelectorPolicy) -> Vec<Candidate> {
    match policy {
        SelectorPolicy::FullSweep => tracked
            .into_iter()
            .filter(|t| t.pending)
            .map(|t| t.candidate)
            .collect(),
        SelectorPolicy::SingleGroup => select_single_group(tracked),
    }
}

fn select_single_group(tracked: Vec<Tracked>) -> Vec<Candidate> {
    let mut items = tracked.into_iter().skip_while(|t| !t.pending);

    let Some(first) = items.next() else {
        return Vec::new();
    };
    let anchor = first.candidate;
    let mut selected = Vec::new();

    for item in items {
        if item.candidate.group_key != anchor.group_key {
            break;
        }
        if item.pending && item.candidate.same_bucket(&anchor) {
            selected.push(item.candidate);
        }
    }

    selected.insert(0, anchor);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: &str, group: &str, slot: &str) -> Candidate {
        Candidate::new(id, id).with_group(group).with_slot(slot)
    }

    fn ids(selected: &[Candidate]) -> Vec<&str> {
        selected.iter().map(|c| c.identifier.as_str()).collect()
    }

    #[test]
    fn test_full_sweep_takes_all_pending() {
        let tracked = vec![
            Tracked::pending(c("a1", "A", "K")),
            Tracked::processed(c("a2", "A", "K")),
            Tracked::pending(c("b1", "B", "K")),
        ];
        assert_eq!(ids(&select(tracked, SelectorPolicy::FullSweep)), vec!["a1", "b1"]);
    }

    #[test]
    fn test_single_group_picks_first_pending_group() {
        let tracked = vec![
            Tracked::processed(c("a1", "A", "K")),
            Tracked::processed(c("a2", "A", "K")),
            Tracked::pending(c("b1", "B", "K")),
            Tracked::pending(c("b2", "B", "K")),
            Tracked::pending(c("c1", "C", "K")),
        ];
        assert_eq!(ids(&select(tracked, SelectorPolicy::SingleGroup)), vec!["b1", "b2"]);
    }

    #[test]
    fn test_single_group_stays_in_slot() {
        let tracked = vec![
            Tracked::pending(c("t1", "Toán", "KNTT")),
            Tracked::pending(c("t2", "Toán", "CTST")),
            Tracked::processed(c("t3", "Toán", "KNTT")),
            Tracked::pending(c("t4", "Toán", "KNTT")),
            Tracked::pending(c("v1", "Văn", "KNTT")),
            Tracked::pending(c("t5", "Toán", "KNTT")),
        ];
        assert_eq!(
            ids(&select(tracked, SelectorPolicy::SingleGroup)),
            vec!["t1", "t4"]
        );
    }

    #[test]
    fn test_nothing_pending_selects_nothing() {
        let tracked = vec![Tracked::processed(c("a1", "A", "K"))];
        assert!(select(tracked.clone(), SelectorPolicy::SingleGroup).is_empty());
        assert!(select(tracked, SelectorPolicy::FullSweep).is_empty());
        assert!(select(Vec::new(), SelectorPolicy::SingleGroup).is_empty());
    }
}
