pub mod compound;
pub mod config;
pub mod distribution;
pub mod error;
pub mod joint;
pub mod markets;
pub mod model;
pub mod price_book;
pub mod pricing;

pub use config::EngineConfig;
pub use error::ModelError;
pub use model::{MatchInputs, MatchModel};
pub use price_book::{MarginPlan, PriceBook};
