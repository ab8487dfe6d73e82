//! Current conditions: the Open-Meteo feed client and the metric-card panel.

pub mod feed;
pub mod presenter;

pub use feed::{ConditionsOutcome, ConditionsSnapshot};
pub use presenter::ConditionsPanel;
