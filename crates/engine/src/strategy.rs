//! The four ways the engine can fill a recommendation list.

use interactions::RecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Latent-factor model scores (`rec`)
    #[serde(rename = "rec", alias = "factorization")]
    Factorization,
    /// Co-occurrence model over the user's own purchases (`own`)
    #[serde(rename = "own")]
    Own,
    /// Nearest neighbour of each of the user's top purchases (`itm`)
    #[serde(rename = "itm", alias = "similar_items")]
    SimilarItems,
    /// One own-purchase pick from each similar user (`usr`)
    #[serde(rename = "usr", alias = "similar_users")]
    SimilarUsers,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Factorization,
        Strategy::Own,
        Strategy::SimilarItems,
        Strategy::SimilarUsers,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Strategy::Factorization => "rec",
            Strategy::Own => "own",
            Strategy::SimilarItems => "itm",
            Strategy::SimilarUsers => "usr",
        }
    }
}

impl FromStr for Strategy {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rec" | "factorization" => Ok(Strategy::Factorization),
            "own" => Ok(Strategy::Own),
            "itm" | "similar_items" => Ok(Strategy::SimilarItems),
            "usr" | "similar_users" => Ok(Strategy::SimilarUsers),
            _ => Err(RecError::UnrecognizedStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
