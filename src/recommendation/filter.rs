//! Randomized acceptance of candidate songs against a taste profile.

use crate::config::RecommendationSettings;
use crate::taste::{FeatureVector, TasteProfile};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Below the cold-start threshold, everything goes through.
    AcceptColdStart,
    AcceptMatch,
    AcceptExploration,
    Reject,
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        !matches!(self, Decision::Reject)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AcceptColdStart => "accepted_cold_start",
            Decision::AcceptMatch => "accepted_match",
            Decision::AcceptExploration => "accepted_exploration",
            Decision::Reject => "rejected",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationFilter {
    cold_start_threshold: u64,
    match_acceptance_percent: u32,
    exploration_acceptance_percent: u32,
}

impl RecommendationFilter {
    pub fn new(settings: &RecommendationSettings) -> Self {
        Self {
            cold_start_threshold: settings.cold_start_threshold,
            match_acceptance_percent: settings.match_acceptance_percent,
            exploration_acceptance_percent: settings.exploration_acceptance_percent,
        }
    }

    /// Filtering only starts once the user rated strictly more songs than
    /// the threshold.
    pub fn is_active(&self, total_ratings: u64) -> bool {
        total_ratings > self.cold_start_threshold
    }

    /// `profile` is `None` during cold start. Past the threshold a missing
    /// profile should be passed as an empty one.
    pub fn decide<R: Rng>(
        &self,
        profile: Option<&TasteProfile>,
        vector: &FeatureVector,
        rng: &mut R,
    ) -> Decision {
        let Some(profile) = profile else {
            return Decision::AcceptColdStart;
        };

        let in_liked = profile.in_liked(vector);
        let in_disliked = profile.in_disliked(vector);

        // NOTE: both rolls share the same threshold, so a candidate outside
        // every liked cluster is accepted nearly as often as a match. Kept
        // as-is until the product side decides on the intended odds.
        let r1 = rng.random_range(0..100u32);
        if r1 < self.match_acceptance_percent && in_liked && !in_disliked {
            return Decision::AcceptMatch;
        }
        let r2 = rng.random_range(0..100u32);
        if r2 < self.exploration_acceptance_percent {
            return Decision::AcceptExploration;
        }
        Decision::Reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taste::TasteCluster;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn filter() -> RecommendationFilter {
        RecommendationFilter::new(&RecommendationSettings::default())
    }

    fn profile_with_liked_at(point: [f64; 6]) -> TasteProfile {
        let mut profile = TasteProfile::empty(1);
        profile.liked_clusters = vec![TasteCluster {
            centroid: FeatureVector::new(point),
            radius: 0.1,
        }];
        profile
    }

    fn acceptance_rate(profile: &TasteProfile, vector: &FeatureVector, trials: usize) -> f64 {
        let filter = filter();
        let mut rng = StdRng::seed_from_u64(1234);
        let accepted = (0..trials)
            .filter(|_| filter.decide(Some(profile), vector, &mut rng).is_accept())
            .count();
        accepted as f64 / trials as f64
    }

    #[test]
    fn threshold_is_strict() {
        let f = filter();
        assert!(!f.is_active(0));
        assert!(!f.is_active(25));
        assert!(f.is_active(26));
    }

    #[test]
    fn cold_start_always_accepts() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert_eq!(
                filter().decide(None, &FeatureVector::ZERO, &mut rng),
                Decision::AcceptColdStart
            );
        }
    }

    #[test]
    fn liked_centroid_is_accepted_often() {
        let point = [0.2, 0.7, 0.1, 0.4, 0.6, 0.5];
        let profile = profile_with_liked_at(point);
        // 1 - 0.4 * 0.4 = 0.84 expected
        let rate = acceptance_rate(&profile, &FeatureVector::new(point), 5_000);
        assert!(rate >= 0.6, "rate {}", rate);
        assert!(rate > 0.78 && rate < 0.9, "rate {}", rate);
    }

    #[test]
    fn outsider_is_accepted_by_exploration_only() {
        let profile = profile_with_liked_at([0.0; 6]);
        let rate = acceptance_rate(&profile, &FeatureVector::new([1.0; 6]), 5_000);
        assert!(rate > 0.55 && rate < 0.65, "rate {}", rate);

        let mut rng = StdRng::seed_from_u64(9);
        let decisions: Vec<Decision> = (0..500)
            .map(|_| filter().decide(Some(&profile), &FeatureVector::new([1.0; 6]), &mut rng))
            .collect();
        assert!(!decisions.contains(&Decision::AcceptMatch));
    }

    #[test]
    fn disliked_overlap_blocks_match() {
        let point = [0.5; 6];
        let mut profile = profile_with_liked_at(point);
        profile.disliked_clusters = vec![TasteCluster {
            centroid: FeatureVector::new(point),
            radius: 0.0,
        }];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let decision = filter().decide(Some(&profile), &FeatureVector::new(point), &mut rng);
            assert_ne!(decision, Decision::AcceptMatch);
        }
    }

    #[test]
    fn zero_percent_rejects_everything() {
        let settings = RecommendationSettings {
            match_acceptance_percent: 0,
            exploration_acceptance_percent: 0,
            ..Default::default()
        };
        let filter = RecommendationFilter::new(&settings);
        let profile = profile_with_liked_at([0.5; 6]);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(
                filter.decide(Some(&profile), &FeatureVector::new([0.5; 6]), &mut rng),
                Decision::Reject
            );
        }
    }
}
