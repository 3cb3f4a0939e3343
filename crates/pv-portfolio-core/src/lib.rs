pub mod assumptions;
pub mod error;
pub mod kpi;
pub mod model;
pub mod portfolio;
pub mod projection;
pub mod snapshot;
pub mod time_value;
pub mod types;

#[cfg(feature = "csv")]
pub mod export;

pub use assumptions::Assumptions;
pub use error::PvFinanceError;
pub use model::{compute, PortfolioModelOutput};
pub use portfolio::PortfolioObject;
pub use types::*;

/// Standard result type for all pv-portfolio operations
pub type PvFinanceResult<T> = Result<T, PvFinanceError>;
