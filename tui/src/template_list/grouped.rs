//! Reordering across named groups, such as catalog services filed under categories.
//!
//! A drop names a destination group and a position within it. The move is applied optimistically
//! to both groups at once and persisted as a single request.

use studio_protocol::ordering::DropTarget;
use studio_protocol::ordering::Grouped;
use studio_protocol::ordering::group_members;
use studio_protocol::ordering::move_across_groups;
use studio_protocol::ordering::position_of;

use super::optimistic::Optimistic;
use super::reorder::ReorderOutcome;

/// Final order of every group touched by a cross-group move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReorderRequest<Id, G> {
    pub moved: Id,
    /// `(group, ids in order)` for the source group (when different) and the destination.
    pub groups: Vec<(G, Vec<Id>)>,
}

#[derive(Debug, Clone)]
pub struct GroupedReorderList<T: Grouped + Clone> {
    items: Optimistic<Vec<T>>,
    persisting: bool,
}

impl<T: Grouped + Clone> GroupedReorderList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: Optimistic::new(items),
            persisting: false,
        }
    }

    pub fn items(&self) -> &[T] {
        self.items.get()
    }

    pub fn is_busy(&self) -> bool {
        self.persisting
    }

    /// Members of `group` sorted by order.
    pub fn group(&self, group: &T::Group) -> Vec<&T> {
        group_members(self.items(), group)
    }

    /// Move `source` into `target`, renumbering the source and destination groups.
    ///
    /// Returns `None` when `source` is unknown, the drop would not move it, or a previous move is
    /// still persisting.
    pub fn on_drag_end(
        &mut self,
        source: &T::Id,
        target: &DropTarget<T::Group>,
    ) -> Option<GroupReorderRequest<T::Id, T::Group>> {
        if self.persisting {
            tracing::debug!("ignoring grouped drop while a reorder is persisting");
            return None;
        }
        let source_group = position_of(self.items(), source)
            .map(|idx| self.items()[idx].group().clone())?;
        if !self
            .items
            .apply(|items| move_across_groups(items, source, target))
        {
            return None;
        }
        self.persisting = true;

        let mut touched = vec![source_group];
        if touched[0] != target.group {
            touched.push(target.group.clone());
        }
        let groups = touched
            .into_iter()
            .map(|group| {
                let ids = self
                    .group(&group)
                    .into_iter()
                    .map(|item| item.id().clone())
                    .collect();
                (group, ids)
            })
            .collect();
        Some(GroupReorderRequest {
            moved: source.clone(),
            groups,
        })
    }

    pub fn commit(&mut self) -> Option<ReorderOutcome> {
        if !std::mem::take(&mut self.persisting) {
            return None;
        }
        self.items.commit();
        Some(ReorderOutcome::Committed)
    }

    pub fn rollback(&mut self) -> Option<ReorderOutcome> {
        if !std::mem::take(&mut self.persisting) {
            return None;
        }
        self.items.rollback();
        Some(ReorderOutcome::RolledBack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use studio_protocol::ordering::Ordered;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Service {
        id: &'static str,
        category: &'static str,
        order: usize,
    }

    impl Ordered for Service {
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

    impl Grouped for Service {
        type Group = &'static str;

        fn group(&self) -> &Self::Group {
            &self.category
        }

        fn set_group(&mut self, group: Self::Group) {
            self.category = group;
        }
    }

    fn catalog() -> GroupedReorderList<Service> {
        GroupedReorderList::new(vec![
            Service {
                id: "boda-basica",
                category: "bodas",
                order: 0,
            },
            Service {
                id: "boda-full",
                category: "bodas",
                order: 1,
            },
            Service {
                id: "album",
                category: "bodas",
                order: 2,
            },
            Service {
                id: "quince",
                category: "fiestas",
                order: 0,
            },
        ])
    }

    fn orders(
        list: &GroupedReorderList<Service>,
        group: &'static str,
    ) -> Vec<(&'static str, usize)> {
        list.group(&group)
            .into_iter()
            .map(|service| (service.id, service.order))
            .collect()
    }

    #[test]
    fn cross_group_move_renumbers_both_groups() {
        let mut list = catalog();
        let request = list
            .on_drag_end(
                &"boda-full",
                &DropTarget {
                    group: "fiestas",
                    index: 0,
                },
            )
            .expect("request");

        assert_eq!(
            request,
            GroupReorderRequest {
                moved: "boda-full",
                groups: vec![
                    ("bodas", vec!["boda-basica", "album"]),
                    ("fiestas", vec!["boda-full", "quince"]),
                ],
            }
        );
        assert_eq!(orders(&list, "bodas"), vec![("boda-basica", 0), ("album", 1)]);
        assert_eq!(
            orders(&list, "fiestas"),
            vec![("boda-full", 0), ("quince", 1)]
        );
        assert!(list.is_busy());
        assert_eq!(list.commit(), Some(ReorderOutcome::Committed));
        assert!(!list.is_busy());
    }

    #[test]
    fn same_group_move_reports_one_group() {
        let mut list = catalog();
        let request = list
            .on_drag_end(
                &"album",
                &DropTarget {
                    group: "bodas",
                    index: 0,
                },
            )
            .expect("request");
        assert_eq!(
            request.groups,
            vec![("bodas", vec!["album", "boda-basica", "boda-full"])]
        );
    }

    #[test]
    fn rollback_and_busy_rejection() {
        let mut list = catalog();
        let before = list.items().to_vec();
        let target = DropTarget {
            group: "fiestas",
            index: 9,
        };
        list.on_drag_end(&"album", &target).expect("request");
        assert_eq!(list.on_drag_end(&"quince", &target), None);

        assert_eq!(list.rollback(), Some(ReorderOutcome::RolledBack));
        assert_eq!(list.items(), before.as_slice());
        assert_eq!(list.rollback(), None);
    }

    #[test]
    fn unknown_or_in_place_drops_are_noops() {
        let mut list = catalog();
        let in_place = DropTarget {
            group: "bodas",
            index: 1,
        };
        assert_eq!(list.on_drag_end(&"boda-full", &in_place), None);
        assert_eq!(list.on_drag_end(&"nada", &in_place), None);
        assert!(!list.is_busy());
    }
}
