//! Request-time parameter binder.
//!
//! The external matcher captures one raw string per wildcard placeholder.
//! For a compound zone that single token still contains the literal `-`/`.`
//! separators, so the binder walks the zone's token stream to split it back
//! into per-name values.

use super::{ParamVec, ParamZone, Separator, ZoneToken};

/// Bind the raw token captured for a zone's placeholder to the zone's
/// parameter names.
///
/// Scans `raw` character by character with a cursor into the token stream.
/// A literal `-` or `.` is treated as a zone boundary only when the next
/// expected token is the matching sentinel; the accumulated value is then
/// bound to the current name and accumulation restarts for the next name.
/// Otherwise the character accumulates into the current value literally, so
/// values may themselves contain hyphens or dots wherever no separator is
/// expected. At end of input the remaining value binds to the current name
/// and any names left unvisited bind to the empty string; no parameter is
/// ever left unset.
///
/// Known limitation: a value containing the separator character exactly
/// where a sentinel is expected cannot be distinguished from a zone
/// boundary. The boundary interpretation wins.
///
/// # Arguments
///
/// * `zone` - The zone descriptor created at registration
/// * `raw` - The single token the matcher captured for this zone
///
/// # Returns
///
/// Name/value pairs in zone order.
#[must_use]
pub fn bind(zone: &ParamZone, raw: &str) -> ParamVec {
    let tokens = zone.tokens();
    let mut params = ParamVec::new();

    // Cursor always rests on a Param token; the following token (if any) is
    // the separator expected next.
    let mut cursor = 0;
    let mut value = String::new();

    for ch in raw.chars() {
        let boundary = Separator::from_char(ch).is_some_and(|sep| {
            matches!(tokens.get(cursor + 1), Some(ZoneToken::Separator(expected)) if *expected == sep)
        });
        if boundary {
            if let Some(ZoneToken::Param(name)) = tokens.get(cursor) {
                params.push((name.clone(), std::mem::take(&mut value)));
            }
            cursor += 2;
        } else {
            value.push(ch);
        }
    }

    if !value.is_empty() && cursor < tokens.len() {
        if let Some(ZoneToken::Param(name)) = tokens.get(cursor) {
            params.push((name.clone(), std::mem::take(&mut value)));
        }
        cursor += 2;
    }

    // Any name the scan never reached binds to the empty string.
    while cursor < tokens.len() {
        if let Some(ZoneToken::Param(name)) = tokens.get(cursor) {
            params.push((name.clone(), String::new()));
        }
        cursor += 2;
    }

    params
}
