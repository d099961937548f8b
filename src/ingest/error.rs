use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("Row is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Trade {id}: unparsable close timestamp '{raw}'")]
    BadCloseTime { id: String, raw: String },

    #[error("Trade {id}: unknown side '{raw}'")]
    BadSide { id: String, raw: String },

    #[error("Trade {id}: '{symbol}' is not a trade row")]
    NotATrade { id: String, symbol: String },

    #[error("Trade {id}: closes before it opens")]
    InvertedTimes { id: String },
}
