//! Candidate solution scoring and ranking

use serde::{Deserialize, Serialize};

use crate::core::identity::EntityId;
use crate::entities::{Solution, SolutionStatus};

/// Formula used to score a candidate solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// `impact x 2 - effort - risk - cost`, roughly -30..=20
    #[default]
    Linear,
    /// Impact weighted 0.4, inverted effort/risk/cost 0.2 each, scaled to 0..=100
    NormalizedWeighted,
}

impl ScoringStrategy {
    pub fn score(&self, solution: &Solution) -> f64 {
        let impact = solution.impact as f64;
        let effort = solution.effort as f64;
        let risk = solution.risk as f64;
        let cost = solution.cost as f64;
        match self {
            ScoringStrategy::Linear => impact * 2.0 - effort - risk - cost,
            ScoringStrategy::NormalizedWeighted => {
                10.0 * (0.4 * impact
                    + 0.2 * (10.0 - effort)
                    + 0.2 * (10.0 - risk)
                    + 0.2 * (10.0 - cost))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoringStrategy::Linear => "linear",
            ScoringStrategy::NormalizedWeighted => "normalized_weighted",
        }
    }
}

impl std::str::FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(ScoringStrategy::Linear),
            "normalized_weighted" | "weighted" => Ok(ScoringStrategy::NormalizedWeighted),
            _ => Err(format!(
                "Unknown scoring strategy: {}. Use linear or normalized_weighted",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSolution {
    pub rank: usize,
    pub id: EntityId,
    pub title: String,
    pub score: f64,
    pub status: SolutionStatus,
}

/// Solutions ordered best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRanking {
    pub strategy: ScoringStrategy,
    pub ranked: Vec<RankedSolution>,
}

impl SolutionRanking {
    /// The highest-scoring candidate. Selecting it is the caller's decision.
    pub fn recommended(&self) -> Option<&RankedSolution> {
        self.ranked.first()
    }
}

/// Rank solutions by descending score; equal scores keep input order
pub fn rank_solutions(solutions: &[Solution], strategy: ScoringStrategy) -> SolutionRanking {
    let mut scored: Vec<(f64, &Solution)> =
        solutions.iter().map(|s| (strategy.score(s), s)).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let ranked = scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, s))| RankedSolution {
            rank: i + 1,
            id: s.id.clone(),
            title: s.title.clone(),
            score,
            status: s.status,
        })
        .collect();

    SolutionRanking { strategy, ranked }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_score() {
        let sol = Solution::new("Read replica", 8, 4, 3, 3);
        assert_eq!(ScoringStrategy::Linear.score(&sol), 6.0);
    }

    #[test]
    fn test_linear_score_range() {
        assert_eq!(ScoringStrategy::Linear.score(&Solution::new("best", 10, 0, 0, 0)), 20.0);
        assert_eq!(ScoringStrategy::Linear.score(&Solution::new("worst", 0, 10, 10, 10)), -30.0);
    }

    #[test]
    fn test_normalized_weighted_score() {
        let sol = Solution::new("Read replica", 8, 4, 3, 3);
        // 10 * (3.2 + 1.2 + 1.4 + 1.4)
        assert!((ScoringStrategy::NormalizedWeighted.score(&sol) - 72.0).abs() < 1e-9);
        assert_eq!(
            ScoringStrategy::NormalizedWeighted.score(&Solution::new("best", 10, 0, 0, 0)),
            100.0
        );
    }

    #[test]
    fn test_ranking_orders_descending_and_keeps_ties_stable() {
        let solutions = vec![
            Solution::new("tie-first", 5, 2, 2, 2),
            Solution::new("best", 9, 1, 1, 1),
            Solution::new("tie-second", 5, 2, 2, 2),
            Solution::new("worst", 1, 9, 9, 9),
        ];
        let ranking = rank_solutions(&solutions, ScoringStrategy::Linear);
        let titles: Vec<_> = ranking.ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["best", "tie-first", "tie-second", "worst"]);
        assert_eq!(ranking.recommended().unwrap().title, "best");
        assert_eq!(ranking.ranked[3].rank, 4);
    }

    #[test]
    fn test_ranking_does_not_touch_status() {
        let solutions = vec![Solution::new("only", 8, 4, 3, 3)];
        let ranking = rank_solutions(&solutions, ScoringStrategy::Linear);
        assert_eq!(ranking.ranked[0].status, SolutionStatus::Proposed);
        assert_eq!(solutions[0].status, SolutionStatus::Proposed);
    }

    #[test]
    fn test_empty_ranking_has_no_recommendation() {
        assert!(rank_solutions(&[], ScoringStrategy::Linear).recommended().is_none());
    }
}
