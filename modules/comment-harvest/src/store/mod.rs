pub mod export;
pub mod layout;
pub mod persist;

pub use export::{export_discovery, export_failed_items, write_reference_list, DiscoveryExport};
pub use layout::OutputLayout;
pub use persist::persist;
