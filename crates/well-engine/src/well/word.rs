use serde::{Deserialize, Serialize};

/// Base orb diameter for a word with zero votes, in playfield pixels.
pub const ORB_BASE_DIAMETER: f32 = 40.0;
/// Diameter gained per vote.
pub const ORB_VOTE_STEP: f32 = 10.0;

/// A word in the well. Owned exclusively by the host; the presentation
/// surface only ever holds a read-derived copy pushed over the channel.
/// Words are append-only and grow by vote increments — there is no removal
/// path in the current protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub text: String,
    pub votes: u32,
    pub color: String,
}

impl Word {
    /// The orb radius for this word's current vote count.
    pub fn radius(&self) -> f32 {
        orb_radius(self.votes)
    }
}

/// Orb radius as a pure function of the vote count:
/// `(base + votes * step) / 2`.
pub fn orb_radius(votes: u32) -> f32 {
    (ORB_BASE_DIAMETER + votes as f32 * ORB_VOTE_STEP) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_formula() {
        assert_eq!(orb_radius(0), 20.0);
        assert_eq!(orb_radius(1), 25.0);
        assert_eq!(orb_radius(6), 50.0);
    }

    #[test]
    fn rescale_ratio_matches_vote_ratio() {
        // r2/r1 == (40 + 10*v2) / (40 + 10*v1) for any pair of vote counts.
        for v1 in 0u32..20 {
            for v2 in 0u32..20 {
                let lhs = orb_radius(v2) / orb_radius(v1);
                let rhs = (40.0 + 10.0 * v2 as f32) / (40.0 + 10.0 * v1 as f32);
                assert!((lhs - rhs).abs() < 1e-6, "v1={v1} v2={v2}");
            }
        }
    }

    #[test]
    fn word_radius_tracks_votes() {
        let mut word = Word {
            id: "1".into(),
            text: "joy".into(),
            votes: 0,
            color: "#fff".into(),
        };
        assert_eq!(word.radius(), 20.0);
        word.votes = 3;
        assert_eq!(word.radius(), 35.0);
    }
}
