use serde::{Deserialize, Serialize};
use std::fmt;

/// The side of a target price that an observed price has crossed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertDirection {
    Above,
    Below,
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertDirection::Above => write!(f, "ABOVE"),
            AlertDirection::Below => write!(f, "BELOW"),
        }
    }
}
