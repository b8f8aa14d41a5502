#![forbid(unsafe_code)]

//! Core data model for the tag catalog editor.
//!
//! Everything here is pure and synchronous: item records, dataset
//! normalization, filtering, hierarchy construction, and the pointer input
//! types. Stateful editing lives in `tagdeck-state`.

pub mod catalog;
pub mod event;
pub mod event_coalescer;
pub mod filter;
pub mod geometry;
pub mod hierarchy;
pub mod item;
pub mod normalize;

pub use catalog::Catalog;
pub use event::{PointerEvent, PointerKind};
pub use event_coalescer::PointerCoalescer;
pub use filter::{ComplianceFilter, FilterCriteria, FilterOptions};
pub use geometry::{Point, RowBounds};
pub use hierarchy::{ContainerKey, HierarchyNode, LeafSlot, Level, ToggleState};
pub use item::{ComplianceFlags, ItemId, ItemRecord};
pub use normalize::LoadReport;
