//! Ordered collections: array-move reordering with contiguous renumbering.
//!
//! Every sibling collection keeps its `order` values as a permutation of `0..n`. Reordering is a
//! single array move: the source item is removed and reinserted at the target index, and every
//! item between the two positions shifts by one slot.
//!
//! Grouped collections (catalog services inside categories) keep that invariant per group. A
//! cross-group move renumbers the source group and the destination group independently.

/// An entity with a stable identifier and a position among its siblings.
pub trait Ordered {
    type Id: PartialEq + Clone;

    fn id(&self) -> &Self::Id;
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize);
}

/// An ordered entity that also belongs to a named group.
pub trait Grouped: Ordered {
    type Group: PartialEq + Clone;

    fn group(&self) -> &Self::Group;
    fn set_group(&mut self, group: Self::Group);
}

/// Destination of a cross-group move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget<G> {
    pub group: G,
    /// Position within the destination group, clamped to the group length.
    pub index: usize,
}

pub fn position_of<T: Ordered>(items: &[T], id: &T::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Sort by `order`, keeping the current relative position of ties.
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(Ordered::order);
}

/// Rewrite `order` so it matches slice position.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_order(idx);
    }
}

/// True when the `order` values are exactly `0..items.len()`, each used once.
pub fn is_contiguous<T: Ordered>(items: &[T]) -> bool {
    let mut seen = vec![false; items.len()];
    for item in items {
        match seen.get_mut(item.order()) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

/// Move the item at `from` to `to`. Returns false when either index is out of range or the
/// indices are equal.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

/// Move `source` into the slot currently occupied by `target` and renumber.
///
/// `items` must already be sorted by order. Returns false (leaving `items` untouched) when the
/// ids are equal or either id is unknown.
pub fn move_by_id<T: Ordered>(items: &mut Vec<T>, source: &T::Id, target: &T::Id) -> bool {
    if source == target {
        return false;
    }
    let (Some(from), Some(to)) = (position_of(items, source), position_of(items, target)) else {
        return false;
    };
    if !array_move(items, from, to) {
        return false;
    }
    renumber(items);
    true
}

/// Members of `group`, sorted by order.
pub fn group_members<'a, T: Grouped>(items: &'a [T], group: &T::Group) -> Vec<&'a T> {
    let mut members: Vec<&T> = items.iter().filter(|item| item.group() == group).collect();
    members.sort_by_key(|item| item.order());
    members
}

/// Move `source` into `target.group` at `target.index`, renumbering both affected groups.
///
/// Returns false when `source` is unknown or the move would leave it where it already is.
pub fn move_across_groups<T: Grouped>(
    items: &mut [T],
    source: &T::Id,
    target: &DropTarget<T::Group>,
) -> bool {
    let Some(source_pos) = position_of(items, source) else {
        return false;
    };
    let source_group = items[source_pos].group().clone();

    let destination: Vec<T::Id> = group_members(items, &target.group)
        .into_iter()
        .map(|item| item.id().clone())
        .filter(|id| id != source)
        .collect();
    let index = target.index.min(destination.len());

    if source_group == target.group {
        let current = group_members(items, &source_group)
            .iter()
            .position(|item| item.id() == source);
        if current == Some(index) {
            return false;
        }
    }

    let remaining_source: Vec<T::Id> = if source_group == target.group {
        Vec::new()
    } else {
        group_members(items, &source_group)
            .into_iter()
            .map(|item| item.id().clone())
            .filter(|id| id != source)
            .collect()
    };

    items[source_pos].set_group(target.group.clone());

    let mut destination = destination;
    destination.insert(index, source.clone());
    assign_orders(items, &destination);
    assign_orders(items, &remaining_source);
    true
}

fn assign_orders<T: Ordered>(items: &mut [T], ids_in_order: &[T::Id]) {
    for (order, id) in ids_in_order.iter().enumerate() {
        if let Some(item) = items.iter_mut().find(|item| item.id() == id) {
            item.set_order(order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: &'static str,
        group: &'static str,
        order: usize,
    }

    impl Ordered for Item {
        type Id = &'static str;

        fn id(&self) -> &Self::Id {
            &self.id
        }

        fn order(&self) -> usize {
            self.order
        }

        fn set_order(&mut self, order: usize) {
            self.order = order;
        }
    }

    impl Grouped for Item {
        type Group = &'static str;

        fn group(&self) -> &Self::Group {
            &self.group
        }

        fn set_group(&mut self, group: Self::Group) {
            self.group = group;
        }
    }

    fn flat(ids: &[&'static str]) -> Vec<Item> {
        ids.iter()
            .enumerate()
            .map(|(order, id)| Item {
                id: *id,
                group: "",
                order,
            })
            .collect()
    }

    fn ids_and_orders(items: &[Item]) -> Vec<(&'static str, usize)> {
        items.iter().map(|item| (item.id, item.order)).collect()
    }

    #[test]
    fn dragging_last_to_first_shifts_the_rest_down() {
        let mut items = flat(&["A", "B", "C"]);
        assert!(move_by_id(&mut items, &"C", &"A"));
        assert_eq!(ids_and_orders(&items), vec![("C", 0), ("A", 1), ("B", 2)]);
    }

    #[test]
    fn dragging_first_to_last_shifts_the_rest_up() {
        let mut items = flat(&["A", "B", "C"]);
        assert!(move_by_id(&mut items, &"A", &"C"));
        assert_eq!(ids_and_orders(&items), vec![("B", 0), ("C", 1), ("A", 2)]);
    }

    #[test]
    fn same_or_unknown_ids_are_no_ops() {
        let mut items = flat(&["A", "B"]);
        assert!(!move_by_id(&mut items, &"A", &"A"));
        assert!(!move_by_id(&mut items, &"A", &"Z"));
        assert!(!move_by_id(&mut items, &"Z", &"A"));
        assert_eq!(ids_and_orders(&items), vec![("A", 0), ("B", 1)]);
    }

    #[test]
    fn every_single_move_keeps_orders_contiguous() {
        let ids = ["A", "B", "C", "D", "E"];
        for from in ids {
            for to in ids {
                let mut items = flat(&ids);
                move_by_id(&mut items, &from, &to);
                assert!(is_contiguous(&items), "{from} -> {to}");
                assert_eq!(items.len(), ids.len());
            }
        }
    }

    #[test]
    fn contiguity_detects_gaps_and_duplicates() {
        let mut items = flat(&["A", "B", "C"]);
        assert!(is_contiguous(&items));
        items[2].order = 3;
        assert!(!is_contiguous(&items));
        items[2].order = 1;
        assert!(!is_contiguous(&items));
    }

    fn grouped() -> Vec<Item> {
        vec![
            Item { id: "foto", group: "bodas", order: 0 },
            Item { id: "video", group: "bodas", order: 1 },
            Item { id: "album", group: "bodas", order: 2 },
            Item { id: "dron", group: "extras", order: 0 },
            Item { id: "cabina", group: "extras", order: 1 },
        ]
    }

    fn group_ids(items: &[Item], group: &'static str) -> Vec<(&'static str, usize)> {
        group_members(items, &group)
            .into_iter()
            .map(|item| (item.id, item.order))
            .collect()
    }

    #[test]
    fn cross_group_move_renumbers_both_groups() {
        let mut items = grouped();
        let moved = move_across_groups(
            &mut items,
            &"video",
            &DropTarget { group: "extras", index: 1 },
        );
        assert!(moved);
        assert_eq!(group_ids(&items, "bodas"), vec![("foto", 0), ("album", 1)]);
        assert_eq!(
            group_ids(&items, "extras"),
            vec![("dron", 0), ("video", 1), ("cabina", 2)]
        );
    }

    #[test]
    fn cross_group_index_is_clamped_to_group_end() {
        let mut items = grouped();
        assert!(move_across_groups(
            &mut items,
            &"foto",
            &DropTarget { group: "extras", index: 99 },
        ));
        assert_eq!(
            group_ids(&items, "extras"),
            vec![("dron", 0), ("cabina", 1), ("foto", 2)]
        );
        assert_eq!(group_ids(&items, "bodas"), vec![("video", 0), ("album", 1)]);
    }

    #[test]
    fn moving_into_an_empty_group_starts_at_zero() {
        let mut items = grouped();
        assert!(move_across_groups(
            &mut items,
            &"dron",
            &DropTarget { group: "nuevos", index: 3 },
        ));
        assert_eq!(group_ids(&items, "nuevos"), vec![("dron", 0)]);
        assert_eq!(group_ids(&items, "extras"), vec![("cabina", 0)]);
    }

    #[test]
    fn same_group_move_behaves_like_array_move() {
        let mut items = grouped();
        assert!(move_across_groups(
            &mut items,
            &"album",
            &DropTarget { group: "bodas", index: 0 },
        ));
        assert_eq!(
            group_ids(&items, "bodas"),
            vec![("album", 0), ("foto", 1), ("video", 2)]
        );
        assert_eq!(group_ids(&items, "extras"), vec![("dron", 0), ("cabina", 1)]);
    }

    #[test]
    fn dropping_in_place_is_a_no_op() {
        let mut items = grouped();
        let before = items.clone();
        assert!(!move_across_groups(
            &mut items,
            &"video",
            &DropTarget { group: "bodas", index: 1 },
        ));
        assert!(!move_across_groups(
            &mut items,
            &"missing",
            &DropTarget { group: "bodas", index: 0 },
        ));
        assert_eq!(items, before);
    }
}
