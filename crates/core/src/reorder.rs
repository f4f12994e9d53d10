//! Drag-and-drop reordering.
//!
//! Positions are 1-based and contiguous after every move, so the slide shown
//! first always has `order == 1`.

use thiserror::Error;

use crate::content::Content;
use crate::types::ContentId;

/// Something with an id and a display position.
pub trait Ordered {
    fn id(&self) -> ContentId;
    fn order(&self) -> i32;
    fn set_order(&mut self, order: i32);
}

impl Ordered for Content {
    fn id(&self) -> ContentId {
        self.id
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

/// Errors from reordering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("position {index} is out of range for {len} items")]
    OutOfRange { index: usize, len: usize },

    #[error("unknown id {0}")]
    UnknownId(ContentId),
}

/// Move the element at `from` to `to` and renumber everything from 1.
///
/// After the call the moved element has `order == to + 1`.
///
/// # Errors
///
/// Returns [`ReorderError::OutOfRange`] if either index is past the end.
pub fn move_item<T: Ordered>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), ReorderError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(ReorderError::OutOfRange { index, len });
        }
    }
    let moved = items.remove(from);
    items.insert(to, moved);
    renumber(items);
    Ok(())
}

/// Apply a full ordering given as a list of ids.
///
/// Named items come first in the given order; items not named keep their
/// relative order after them. Positions are renumbered from 1.
///
/// # Errors
///
/// Returns [`ReorderError::UnknownId`] if `ids` names an id not in `items`.
pub fn reorder_by_ids<T: Ordered>(items: &mut Vec<T>, ids: &[ContentId]) -> Result<(), ReorderError> {
    if let Some(unknown) = ids.iter().find(|id| !items.iter().any(|i| i.id() == **id)) {
        return Err(ReorderError::UnknownId(*unknown));
    }
    let rank = |item: &T| {
        ids.iter()
            .position(|id| *id == item.id())
            .unwrap_or(ids.len())
    };
    // Stable sort keeps unnamed items in their current relative order.
    items.sort_by_key(|item| rank(item));
    renumber(items);
    Ok(())
}

/// Assign contiguous positions from 1 in slice order.
pub fn renumber<T: Ordered>(items: &mut [T]) {
    for (position, item) in (1..).zip(items.iter_mut()) {
        item.set_order(position);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Slide {
        id: ContentId,
        order: i32,
    }

    impl Ordered for Slide {
        fn id(&self) -> ContentId {
            self.id
        }
        fn order(&self) -> i32 {
            self.order
        }
        fn set_order(&mut self, order: i32) {
            self.order = order;
        }
    }

    fn slides(n: i64) -> Vec<Slide> {
        (1..=n)
            .map(|i| Slide {
                id: ContentId::new(i * 10),
                order: i32::try_from(i).unwrap(),
            })
            .collect()
    }

    fn layout(items: &[Slide]) -> Vec<(i64, i32)> {
        items.iter().map(|s| (s.id.as_i64(), s.order)).collect()
    }

    #[test]
    fn test_move_down_renumbers_contiguously() {
        let mut items = slides(4);
        move_item(&mut items, 0, 2).unwrap();
        assert_eq!(layout(&items), vec![(20, 1), (30, 2), (10, 3), (40, 4)]);
    }

    #[test]
    fn test_move_up_gives_moved_item_target_plus_one() {
        let mut items = slides(4);
        move_item(&mut items, 3, 1).unwrap();
        assert_eq!(items[1].id, ContentId::new(40));
        assert_eq!(items[1].order, 2);
        assert_eq!(layout(&items), vec![(10, 1), (40, 2), (20, 3), (30, 4)]);
    }

    #[test]
    fn test_move_renumbers_gapped_positions() {
        let mut items = vec![
            Slide { id: ContentId::new(1), order: 5 },
            Slide { id: ContentId::new(2), order: 9 },
        ];
        move_item(&mut items, 1, 1).unwrap();
        assert_eq!(layout(&items), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_move_out_of_range() {
        let mut items = slides(2);
        assert_eq!(
            move_item(&mut items, 0, 2),
            Err(ReorderError::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(layout(&items), vec![(10, 1), (20, 2)]);
    }

    #[test]
    fn test_reorder_by_ids_puts_unnamed_last() {
        let mut items = slides(4);
        reorder_by_ids(&mut items, &[ContentId::new(30), ContentId::new(10)]).unwrap();
        assert_eq!(layout(&items), vec![(30, 1), (10, 2), (20, 3), (40, 4)]);
    }

    #[test]
    fn test_reorder_by_ids_rejects_unknown() {
        let mut items = slides(2);
        assert_eq!(
            reorder_by_ids(&mut items, &[ContentId::new(99)]),
            Err(ReorderError::UnknownId(ContentId::new(99)))
        );
    }
}
