pub mod breakdown;
pub mod equity;
pub mod monthly;
pub mod similarity;
pub mod streaks;

pub use breakdown::{LossBreakdown, PROFIT_FACTOR_CAP};
pub use equity::{DrawdownAnalyzer, DrawdownEpisode, EquityPoint};
pub use monthly::{MonthKey, MonthlyEvaluation, MonthlyScorer, Rating, SkillTier};
pub use similarity::{SimilarTrade, SimilarTradeStats, SimilarityMatcher};
pub use streaks::{LossStreakReport, LossStreakSequence, StreakDetector, StreakScan, StreakSummary};
