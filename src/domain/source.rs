use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Arena,
    Pinterest,
    Savee,
    Shotdeck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    DirectApi,
    AuthenticatedBrowser,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Arena,
        Source::Pinterest,
        Source::Savee,
        Source::Shotdeck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Arena => "arena",
            Source::Pinterest => "pinterest",
            Source::Savee => "savee",
            Source::Shotdeck => "shotdeck",
        }
    }

    pub fn retrieval_mode(&self) -> RetrievalMode {
        match self {
            Source::Arena => RetrievalMode::DirectApi,
            Source::Pinterest | Source::Savee | Source::Shotdeck => {
                RetrievalMode::AuthenticatedBrowser
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arena" => Ok(Source::Arena),
            "pinterest" => Ok(Source::Pinterest),
            "savee" => Ok(Source::Savee),
            "shotdeck" => Ok(Source::Shotdeck),
            other => Err(format!("{} is not a supported platform", other)),
        }
    }
}
