pub mod buckets;
pub mod side;
pub mod trade;

pub use buckets::{HoldingBucket, MatchSession, RBucket, SessionBucket, StreakSlot};
pub use side::Side;
pub use trade::{AnnotationMap, TradeAnnotation, TradeRecord};
