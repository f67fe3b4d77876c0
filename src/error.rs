use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid {field}: {value} ({reason})")]
    InvalidParameter {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("grid size mismatch: home has {home} goal slots, away has {away}")]
    GridMismatch { home: usize, away: usize },
}

impl ModelError {
    pub(crate) fn invalid(field: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            field,
            value,
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
