use crate::error::EstimatorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regions the estimator can price in
///
/// The pricing API matches on the human-readable location name, so every
/// region carries both its code and its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    #[default]
    UsEast1,
    UsEast2,
    EuCentral1,
    ApSoutheast1,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::UsEast1,
        Region::UsEast2,
        Region::EuCentral1,
        Region::ApSoutheast1,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::UsEast1 => "us-east-1",
            Self::UsEast2 => "us-east-2",
            Self::EuCentral1 => "eu-central-1",
            Self::ApSoutheast1 => "ap-southeast-1",
        }
    }

    /// Location name sent to the pricing API as the `location` selection
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UsEast1 => "US East (N. Virginia)",
            Self::UsEast2 => "US East (Ohio)",
            Self::EuCentral1 => "EU (Frankfurt)",
            Self::ApSoutheast1 => "Asia Pacific (Singapore)",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Region::ALL
            .into_iter()
            .find(|r| r.code() == code)
            .ok_or_else(|| EstimatorError::UnknownRegion(s.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = EstimatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.code().to_string()
    }
}
