//! Feature stability levels and the minimum-stability gate.
//!
//! Every component, service and foreach block carries a declared stability.
//! The loader is configured with a minimum; a node below the minimum is
//! rejected before dependency analysis so stability violations surface even
//! when references would also fail.
//!
//! The total order is `experimental < public-preview <
//! generally-available`. [`Stability::Undefined`] is the sentinel used when
//! no minimum has been configured; gating against it is always an error for
//! nodes with a defined stability.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Declared stability of a feature, or the undefined sentinel.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Stability {
    /// No stability configured. Displays as `<invalid_stability_level>`.
    #[default]
    Undefined,
    Experimental,
    PublicPreview,
    GenerallyAvailable,
}

impl Stability {
    pub fn is_defined(self) -> bool {
        self != Stability::Undefined
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stability::Undefined => write!(f, "<invalid_stability_level>"),
            Stability::Experimental => write!(f, "experimental"),
            Stability::PublicPreview => write!(f, "public-preview"),
            Stability::GenerallyAvailable => write!(f, "generally-available"),
        }
    }
}

/// Error returned when parsing an unknown stability spelling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stability level {0:?}")]
pub struct ParseStabilityError(String);

impl FromStr for Stability {
    type Err = ParseStabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "experimental" => Ok(Stability::Experimental),
            "public-preview" => Ok(Stability::PublicPreview),
            "generally-available" => Ok(Stability::GenerallyAvailable),
            other => Err(ParseStabilityError(other.to_string())),
        }
    }
}

/// Check a feature's declared stability against the configured minimum.
///
/// `feature_name` is caller-composed and lands verbatim in the message:
/// `component "pkg.kind"` for component blocks, `block "name"` for service
/// blocks, `config block "foreach"` for foreach blocks.
pub fn check_allowed(
    min: Stability,
    feature: Stability,
    feature_name: &str,
) -> Result<(), String> {
    if !min.is_defined() || !feature.is_defined() {
        return Err(format!(
            "stability levels must be defined: got \"{feature}\" as stability of \
             {feature_name} and {min} as the minimum stability level"
        ));
    }
    if feature >= min {
        return Ok(());
    }
    let mut message = format!(
        "{feature_name} is at stability level \"{feature}\", which is below the \
         minimum allowed stability level \"{min}\""
    );
    if feature == Stability::Experimental {
        message.push_str(
            ". Use --stability.level command-line flag to enable \"experimental\"",
        );
    }
    Err(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Stability::Experimental < Stability::PublicPreview);
        assert!(Stability::PublicPreview < Stability::GenerallyAvailable);
        assert!(Stability::Undefined < Stability::Experimental);
    }

    #[test]
    fn test_parse_round_trip() {
        for level in [
            Stability::Experimental,
            Stability::PublicPreview,
            Stability::GenerallyAvailable,
        ] {
            assert_eq!(level.to_string().parse::<Stability>(), Ok(level));
        }
        assert!("beta".parse::<Stability>().is_err());
    }

    #[test]
    fn test_allowed_at_or_above_minimum() {
        assert!(check_allowed(
            Stability::PublicPreview,
            Stability::PublicPreview,
            "component \"tick\"",
        )
        .is_ok());
        assert!(check_allowed(
            Stability::Experimental,
            Stability::GenerallyAvailable,
            "component \"tick\"",
        )
        .is_ok());
    }

    #[test]
    fn test_below_minimum() {
        let err = check_allowed(
            Stability::GenerallyAvailable,
            Stability::PublicPreview,
            "component \"tick\"",
        )
        .unwrap_err();
        assert_eq!(
            err,
            "component \"tick\" is at stability level \"public-preview\", which is \
             below the minimum allowed stability level \"generally-available\""
        );
    }

    #[test]
    fn test_experimental_gets_flag_hint() {
        let err = check_allowed(
            Stability::PublicPreview,
            Stability::Experimental,
            "config block \"foreach\"",
        )
        .unwrap_err();
        assert!(err.ends_with(
            ". Use --stability.level command-line flag to enable \"experimental\""
        ));
    }

    #[test]
    fn test_undefined_minimum() {
        let err = check_allowed(
            Stability::Undefined,
            Stability::PublicPreview,
            "component \"tick\"",
        )
        .unwrap_err();
        assert_eq!(
            err,
            "stability levels must be defined: got \"public-preview\" as stability \
             of component \"tick\" and <invalid_stability_level> as the minimum \
             stability level"
        );
    }
}
