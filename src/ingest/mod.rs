pub mod error;
pub mod raw;
pub mod timestamp;

pub use error::IngestError;
pub use raw::{RawNote, RawTrade};
pub use timestamp::parse_timestamp;

use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::models::{AnnotationMap, Side, TradeAnnotation, TradeRecord};
use raw::{first_text, id_text, is_tradable_symbol};

/// Converts one journal row into a canonical trade.
pub fn normalize(raw: &RawTrade, broker_tz: Tz) -> Result<TradeRecord, IngestError> {
    let id = raw
        .ticket
        .as_ref()
        .and_then(id_text)
        .or_else(|| raw.id.as_ref().and_then(id_text))
        .ok_or(IngestError::MissingField("id"))?;

    let symbol = first_text(&[&raw.pair, &raw.symbol, &raw.item])
        .ok_or(IngestError::MissingField("symbol"))?
        .to_ascii_uppercase();

    let kind_is_cash = raw
        .kind
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty() && Side::parse(k).is_none());
    if kind_is_cash || !is_tradable_symbol(&symbol) {
        return Err(IngestError::NotATrade { id, symbol });
    }

    let side_raw = first_text(&[&raw.side, &raw.action, &raw.kind])
        .ok_or(IngestError::MissingField("side"))?;
    let side = Side::parse(side_raw).ok_or_else(|| IngestError::BadSide {
        id: id.clone(),
        raw: side_raw.to_string(),
    })?;

    // A zero in the account-currency column defers to the plain one.
    let profit = match (raw.profit_yen, raw.profit) {
        (Some(p), _) if p != 0.0 => p,
        (_, Some(p)) => p,
        (Some(p), None) => p,
        (None, None) => return Err(IngestError::MissingField("profit")),
    };
    if !profit.is_finite() {
        return Err(IngestError::MissingField("profit"));
    }

    let close_raw = first_text(&[&raw.close_time, &raw.datetime])
        .ok_or(IngestError::MissingField("close time"))?;
    let close_time = parse_timestamp(close_raw, broker_tz).ok_or_else(|| IngestError::BadCloseTime {
        id: id.clone(),
        raw: close_raw.to_string(),
    })?;

    let open_time = match first_text(&[&raw.open_time]) {
        Some(s) => {
            let parsed = parse_timestamp(s, broker_tz);
            if parsed.is_none() {
                debug!("Trade {}: dropping unparsable open time '{}'", id, s);
            }
            parsed
        }
        None => None,
    };
    if open_time.is_some_and(|o| o > close_time) {
        return Err(IngestError::InvertedTimes { id });
    }

    Ok(TradeRecord {
        id,
        symbol,
        side,
        open_time,
        close_time,
        profit,
        pips: raw.pips.filter(|p| p.is_finite()),
        open_price: raw.open_price.filter(|p| p.is_finite()),
        close_price: raw.close_price.filter(|p| p.is_finite()),
        stop_loss: raw.stop_price.filter(|p| p.is_finite()),
        take_profit: raw.target_price.filter(|p| p.is_finite()),
        strategy: first_text(&[&raw.strategy, &raw.setup, &raw.comment]).map(str::to_string),
    })
}

/// Normalizes every row, skipping the ones that cannot be converted.
pub fn normalize_batch(rows: &[RawTrade], broker_tz: Tz) -> Vec<TradeRecord> {
    let mut trades = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for (i, row) in rows.iter().enumerate() {
        match normalize(row, broker_tz) {
            Ok(t) => trades.push(t),
            Err(e) => {
                skipped += 1;
                warn!("Skipping row {}: {}", i, e);
            }
        }
    }

    info!("Ingested {} trades ({} rows skipped)", trades.len(), skipped);
    trades
}

pub fn annotations(notes: &[RawNote]) -> AnnotationMap {
    let mut map = AnnotationMap::new();
    for note in notes {
        let Some(id) = note.ticket.as_ref().and_then(id_text) else {
            warn!("Skipping note without a ticket");
            continue;
        };
        map.insert(
            id,
            TradeAnnotation {
                entry_basis: note.entry_basis.clone().unwrap_or_default(),
                technical: note.tech_set.clone().unwrap_or_default(),
                market: note.market_set.clone().unwrap_or_default(),
                tags: note.tags.clone().unwrap_or_default(),
            },
        );
    }
    map
}
