//! Active hazard alerts: the NWS feed client and the list panel.

pub mod feed;
pub mod presenter;

pub use feed::{AlertCollection, AlertQuery, AlertRecord};
pub use presenter::AlertsPanel;
