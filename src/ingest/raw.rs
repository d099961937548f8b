use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A journal row as exported by the broker or the journal UI. Several
/// columns exist under more than one name; `ingest` resolves them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTrade {
    pub id: Option<Value>,
    pub ticket: Option<Value>,

    pub pair: Option<String>,
    pub symbol: Option<String>,
    pub item: Option<String>,

    pub side: Option<String>,
    pub action: Option<String>,

    #[serde(rename = "profitYen")]
    pub profit_yen: Option<f64>,
    pub profit: Option<f64>,
    pub pips: Option<f64>,

    #[serde(rename = "closeTime", alias = "close_time")]
    pub close_time: Option<String>,
    pub datetime: Option<String>,
    #[serde(rename = "openTime", alias = "open_time")]
    pub open_time: Option<String>,

    #[serde(rename = "openPrice", alias = "open_price")]
    pub open_price: Option<f64>,
    #[serde(rename = "closePrice", alias = "close_price")]
    pub close_price: Option<f64>,
    #[serde(rename = "stopPrice", alias = "sl")]
    pub stop_price: Option<f64>,
    #[serde(rename = "targetPrice", alias = "tp")]
    pub target_price: Option<f64>,

    pub strategy: Option<String>,
    pub setup: Option<String>,
    pub comment: Option<String>,

    /// Row kind in some exports (`buy`, `sell`, `balance`, ...).
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Journal notes row keyed by ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNote {
    #[serde(alias = "trade_id", alias = "id")]
    pub ticket: Option<Value>,
    #[serde(alias = "entryBasis")]
    pub entry_basis: Option<Vec<String>>,
    #[serde(alias = "technical")]
    pub tech_set: Option<Vec<String>>,
    #[serde(alias = "market")]
    pub market_set: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Renders a string or numeric id; blank strings count as absent.
pub fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First alias that holds a non-blank string.
pub fn first_text<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

const NON_TRADE_KEYWORDS: &[&str] = &[
    "DEPOSIT",
    "CREDIT",
    "BONUS",
    "WITHDRAWAL",
    "WITHDRAW",
    "BALANCE",
    "TRANSFER",
    "PAYMENT",
    "COMMISSION",
    "FEE",
    "REBATE",
    "ADJUSTMENT",
    "CORRECTION",
];

/// True for instrument names: six-letter pairs and metals (EURUSD, XAUUSD)
/// or index codes (US30, NAS100). Cash movements and anything with a hyphen
/// or space are rejected.
pub fn is_tradable_symbol(symbol: &str) -> bool {
    let s = symbol.trim().to_ascii_uppercase();
    if s.is_empty() || s.contains('-') || s.contains(' ') {
        return false;
    }
    if NON_TRADE_KEYWORDS.iter().any(|k| s.contains(k)) {
        return false;
    }

    let letters = s.chars().take_while(|c| c.is_ascii_uppercase()).count();
    let digits = s[letters..].chars().take_while(|c| c.is_ascii_digit()).count();
    if letters + digits != s.len() {
        return false;
    }

    (letters == 6 && digits == 0) || ((2..=4).contains(&letters) && (2..=3).contains(&digits))
}
