use crate::TrackId;
use rand::Rng;

/// Fisher-Yates permutation of `ids`, with `first` (when present) moved to
/// the front.
pub(crate) fn shuffled_order<'a, R>(
    ids: impl Iterator<Item = &'a TrackId>,
    first: Option<&TrackId>,
    rng: &mut R,
) -> Vec<TrackId>
where
    R: Rng,
{
    let mut order: Vec<TrackId> = ids.cloned().collect();

    for i in (1..order.len()).rev() {
        let j = rng.gen_range(0..=i);
        order.swap(i, j);
    }

    if let Some(position) = first.and_then(|id| order.iter().position(|other| other == id)) {
        order[..=position].rotate_right(1);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn ids(count: usize) -> Vec<TrackId> {
        (0..count).map(|i| TrackId(format!("t{}", i))).collect()
    }

    #[test]
    fn test_current_track_comes_first() {
        let ids = ids(8);
        let mut rng = StdRng::seed_from_u64(7);

        for current in &ids {
            let order = shuffled_order(ids.iter(), Some(current), &mut rng);

            assert_eq!(&order[0], current);
            assert_eq!(order.len(), ids.len());
            assert_eq!(
                order.iter().collect::<HashSet<_>>(),
                ids.iter().collect::<HashSet<_>>()
            );
        }
    }

    #[test]
    fn test_unknown_first_is_ignored() {
        let ids = ids(3);
        let mut rng = StdRng::seed_from_u64(1);

        let order = shuffled_order(ids.iter(), Some(&TrackId("x".into())), &mut rng);

        assert_eq!(order.len(), 3);
        assert!(!order.contains(&TrackId("x".into())));
    }

    #[test]
    fn test_empty_list() {
        let mut rng = StdRng::seed_from_u64(1);

        assert!(shuffled_order(ids(0).iter(), None, &mut rng).is_empty());
    }

    #[test]
    fn test_every_position_is_reachable() {
        let ids = ids(4);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_last = HashSet::new();

        for _ in 0..200 {
            let order = shuffled_order(ids.iter(), None, &mut rng);
            seen_last.insert(order[3].clone());
        }

        assert_eq!(seen_last.len(), 4);
    }
}
