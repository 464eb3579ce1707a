pub mod expand_state;
pub mod grouping;
pub mod tree;

pub use expand_state::{ExpandStateStore, MemoryStorage, NodeKey, StateStorage};
pub use grouping::{group_by_date, group_by_date_in, month_name, month_number, DateGroups};
pub use tree::{build_tree, build_tree_in, render_html, MonthNode, TocEntry, TocTree, YearNode};
