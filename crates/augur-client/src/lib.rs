//! Client-side data layer for the Augur forecasting dashboard: requests,
//! normalization into chartable series, model aggregation, live polling and
//! derived metrics.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod facade;
pub mod metrics;
pub mod normalize;
pub mod poller;
pub mod schema;
pub mod settings;
pub mod transport;

pub use config::TransportConfig;
pub use error::{ConfigError, ErrorClass, ErrorKind, Result};
pub use facade::Dashboard;
pub use poller::{PollSession, PollState, PollUpdate};
pub use transport::{HttpTransport, Transport};

pub mod prelude {
    pub use crate::facade::{endpoints, Dashboard};
    pub use crate::metrics::{classify_risk, compute_error_percent};
    pub use crate::poller::{PollSession, PollState, PollUpdate};
    pub use crate::schema::*;
    pub use crate::settings::{JsonFileStore, MemoryStore, Settings, SettingsStore, Theme};
    pub use crate::transport::{HttpTransport, Transport};
    pub use crate::{ErrorClass, ErrorKind, TransportConfig};
}
