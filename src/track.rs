//! Release tracks and track-scoped variant selection.
//!
//! A surface file is either a single command spec or a sequence of variants,
//! each scoped to a set of release tracks. Selecting a track picks exactly
//! one variant; sibling variants must not claim overlapping tracks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// API maturity channel a command is published under.
///
/// Ordered by maturity: `Alpha < Beta < Ga`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseTrack {
    Alpha,
    Beta,
    Ga,
}

impl ReleaseTrack {
    pub const ALL: [ReleaseTrack; 3] = [ReleaseTrack::Alpha, ReleaseTrack::Beta, ReleaseTrack::Ga];

    /// Command group prefix for the track, empty for GA.
    pub fn prefix(&self) -> &'static str {
        match self {
            ReleaseTrack::Alpha => "alpha",
            ReleaseTrack::Beta => "beta",
            ReleaseTrack::Ga => "",
        }
    }
}

impl fmt::Display for ReleaseTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseTrack::Alpha => "ALPHA",
            ReleaseTrack::Beta => "BETA",
            ReleaseTrack::Ga => "GA",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ReleaseTrack {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ALPHA" => Ok(ReleaseTrack::Alpha),
            "BETA" => Ok(ReleaseTrack::Beta),
            "GA" => Ok(ReleaseTrack::Ga),
            other => Err(format!(
                "unknown release track [{other}], expected ALPHA, BETA or GA"
            )),
        }
    }
}

/// Verify that variant track sets are non-empty and pairwise disjoint.
///
/// Returns the offending track on overlap.
pub fn check_disjoint(variants: &[Vec<ReleaseTrack>]) -> Result<(), String> {
    let mut seen: Vec<ReleaseTrack> = Vec::new();
    for (i, tracks) in variants.iter().enumerate() {
        if tracks.is_empty() {
            return Err(format!("variant {} declares no release tracks", i + 1));
        }
        for track in tracks {
            if seen.contains(track) {
                return Err(format!("release track {track} claimed by multiple variants"));
            }
            seen.push(*track);
        }
    }
    Ok(())
}

/// Pick the variant index applicable to `track`, if any.
pub fn select_variant(variants: &[Vec<ReleaseTrack>], track: ReleaseTrack) -> Option<usize> {
    variants.iter().position(|tracks| tracks.contains(&track))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_ordering() {
        assert!(ReleaseTrack::Alpha < ReleaseTrack::Beta);
        assert!(ReleaseTrack::Beta < ReleaseTrack::Ga);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("beta".parse::<ReleaseTrack>().unwrap(), ReleaseTrack::Beta);
        assert_eq!("GA".parse::<ReleaseTrack>().unwrap(), ReleaseTrack::Ga);
        assert!("prod".parse::<ReleaseTrack>().is_err());
    }

    #[test]
    fn test_disjoint_ok() {
        let variants = vec![
            vec![ReleaseTrack::Alpha, ReleaseTrack::Beta],
            vec![ReleaseTrack::Ga],
        ];
        assert!(check_disjoint(&variants).is_ok());
    }

    #[test]
    fn test_overlap_rejected() {
        let variants = vec![
            vec![ReleaseTrack::Alpha, ReleaseTrack::Beta],
            vec![ReleaseTrack::Beta, ReleaseTrack::Ga],
        ];
        let err = check_disjoint(&variants).unwrap_err();
        assert!(err.contains("BETA"));
    }

    #[test]
    fn test_empty_variant_rejected() {
        let variants = vec![vec![], vec![ReleaseTrack::Ga]];
        assert!(check_disjoint(&variants).is_err());
    }

    #[test]
    fn test_select_variant() {
        let variants = vec![vec![ReleaseTrack::Alpha], vec![ReleaseTrack::Ga]];
        assert_eq!(select_variant(&variants, ReleaseTrack::Ga), Some(1));
        assert_eq!(select_variant(&variants, ReleaseTrack::Beta), None);
    }

    #[test]
    fn test_serde_uppercase() {
        let tracks: Vec<ReleaseTrack> = serde_yaml::from_str("[ALPHA, GA]").unwrap();
        assert_eq!(tracks, vec![ReleaseTrack::Alpha, ReleaseTrack::Ga]);
    }
}
