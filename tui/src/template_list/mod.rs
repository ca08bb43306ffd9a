mod grouped;
mod optimistic;
mod reorder;
mod view;

pub use grouped::GroupReorderRequest;
pub use grouped::GroupedReorderList;
pub use optimistic::Optimistic;
pub use reorder::DragPhase;
pub use reorder::ReorderOutcome;
pub use reorder::ReorderRequest;
pub use reorder::ReorderableList;
pub use view::ListAction;
pub use view::TemplateListView;
