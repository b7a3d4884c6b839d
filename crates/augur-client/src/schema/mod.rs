pub mod event;
pub mod model;
pub mod risk;
pub mod series;
pub mod tracker;

pub use event::{EventImpact, Severity};
pub use model::{ModelComparison, ModelName, UnknownModel};
pub use risk::{RiskAssessment, RiskBucket};
pub use series::{Point, TimeSeries};
pub use tracker::TrackerRow;
