//! Session and option types for two-outcome betting events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ValidationError;

/// Default minimum bet, as a percentage of the first bet.
pub const DEFAULT_MIN_BET_PERCENTAGE: u32 = 50;
/// Default maximum bet, as a percentage of the first bet.
pub const DEFAULT_MAX_BET_PERCENTAGE: u32 = 200;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One of the two mutually exclusive outcomes. Serialized as its index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionSide {
    /// Option at index 0.
    #[strum(to_string = "0", serialize = "first")]
    First,
    /// Option at index 1.
    #[strum(to_string = "1", serialize = "second")]
    Second,
}

impl OptionSide {
    /// Both sides in index order.
    pub const BOTH: [OptionSide; 2] = [OptionSide::First, OptionSide::Second];

    /// Array index of this side.
    pub fn index(self) -> usize {
        match self {
            OptionSide::First => 0,
            OptionSide::Second => 1,
        }
    }

    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            OptionSide::First => OptionSide::Second,
            OptionSide::Second => OptionSide::First,
        }
    }
}

impl TryFrom<u8> for OptionSide {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OptionSide::First),
            1 => Ok(OptionSide::Second),
            other => Err(ValidationError::InvalidOption(other)),
        }
    }
}

impl From<OptionSide> for u8 {
    fn from(side: OptionSide) -> Self {
        side.index() as u8
    }
}

/// Limit percentages configured on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetPercentages {
    /// Minimum bet as a percentage of the first bet, in `[1, 100]`.
    pub min: u32,
    /// Maximum bet as a percentage of the first bet, at least 100.
    pub max: u32,
}

impl BetPercentages {
    /// Build from optional overrides, clamping into the allowed ranges.
    pub fn clamped(min: Option<u32>, max: Option<u32>, defaults: BetPercentages) -> Self {
        Self {
            min: min.unwrap_or(defaults.min).clamp(1, 100),
            max: max.unwrap_or(defaults.max).max(100),
        }
    }
}

impl Default for BetPercentages {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_BET_PERCENTAGE,
            max: DEFAULT_MAX_BET_PERCENTAGE,
        }
    }
}

/// A live betting session.
///
/// Title and option names never change once stored. Percentages may change
/// only while the ledger is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identity.
    pub id: SessionId,
    /// Shareable slug, immutable.
    pub slug: String,
    /// Human title.
    pub title: String,
    /// Names of option 0 and option 1.
    pub option_names: [String; 2],
    /// Owner display name.
    pub owner: String,
    /// Limit percentages.
    pub percentages: BetPercentages,
    /// Draft vs. live.
    pub created: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Bumped by the store on every update of the record.
    #[serde(default)]
    pub version: u64,
}

impl Session {
    /// Name of the given option.
    pub fn option_name(&self, side: OptionSide) -> &str {
        &self.option_names[side.index()]
    }

    /// Whether `name` is the owner's display name.
    pub fn is_owner(&self, name: &str) -> bool {
        self.owner == name.trim()
    }
}

/// Client-side session under construction; has no identity yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    /// Human title.
    pub title: String,
    /// Names of option 0 and option 1.
    pub option_names: [String; 2],
    /// Owner display name.
    pub owner: String,
    /// Optional minimum percentage override.
    #[serde(default)]
    pub min_bet_percentage: Option<u32>,
    /// Optional maximum percentage override.
    #[serde(default)]
    pub max_bet_percentage: Option<u32>,
}

impl SessionDraft {
    /// Create a draft with default percentages.
    pub fn new(
        title: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            option_names: [first.into(), second.into()],
            owner: owner.into(),
            min_bet_percentage: None,
            max_bet_percentage: None,
        }
    }

    /// Override the limit percentages.
    pub fn with_percentages(mut self, min: u32, max: u32) -> Self {
        self.min_bet_percentage = Some(min);
        self.max_bet_percentage = Some(max);
        self
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.option_names[0].trim().is_empty() {
            return Err(ValidationError::MissingField("first option name"));
        }
        if self.option_names[1].trim().is_empty() {
            return Err(ValidationError::MissingField("second option name"));
        }
        if self.owner.trim().is_empty() {
            return Err(ValidationError::MissingField("owner name"));
        }
        Ok(())
    }

    /// Promote to a live session. Call [`SessionDraft::validate`] first.
    pub fn into_session(self, slug: String, defaults: BetPercentages) -> Session {
        let [first, second] = self.option_names;
        Session {
            id: SessionId::new(),
            slug,
            title: self.title.trim().to_string(),
            option_names: [first.trim().to_string(), second.trim().to_string()],
            owner: self.owner.trim().to_string(),
            percentages: BetPercentages::clamped(
                self.min_bet_percentage,
                self.max_bet_percentage,
                defaults,
            ),
            created: true,
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
            version: 0,
        }
    }
}
