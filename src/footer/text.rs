use chrono::{DateTime, FixedOffset, Utc};

use crate::foundation::core::{AddressResult, GeoFix};
use crate::foundation::error::GeoCamResult;
use crate::render::text::TextRenderer;

pub const UNKNOWN_LOCATION: &str = "Unknown Location";
pub const ADDRESS_UNAVAILABLE: &str = "Address not available";
pub const ELLIPSIS: &str = "...";

/// Best-effort "city, region, country" title from a free-form address.
///
/// Three or more comma-separated segments yield the last three; fewer yield the first.
pub fn location_title(address: Option<&AddressResult>) -> String {
    let Some(text) = address.map(|a| a.display_text.trim()).filter(|t| !t.is_empty()) else {
        return UNKNOWN_LOCATION.to_string();
    };
    let segments: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match segments.len() {
        0 => UNKNOWN_LOCATION.to_string(),
        n if n >= 3 => segments[n - 3..].join(", "),
        _ => segments[0].to_string(),
    }
}

pub fn address_text(address: Option<&AddressResult>) -> &str {
    address
        .map(|a| a.display_text.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(ADDRESS_UNAVAILABLE)
}

pub fn coordinate_line(fix: Option<&GeoFix>) -> String {
    match fix {
        Some(f) => format!("Lat {:.5}° Long {:.5}°", f.latitude, f.longitude),
        None => "Lat N/A Long N/A".to_string(),
    }
}

/// `now` in the fixed `offset`, e.g. `18/10/2026 02:30:00 PM GMT+05:30`.
pub fn datetime_line(now: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = now.with_timezone(&offset);
    format!("{} {}", local.format("%d/%m/%Y %I:%M:%S %p"), gmt_label(offset))
}

pub fn gmt_label(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let mins = secs.unsigned_abs() / 60;
    format!("GMT{sign}{:02}:{:02}", mins / 60, mins % 60)
}

/// Shorten `text` one character at a time, re-measuring with an ellipsis, until it fits.
///
/// Returns an empty string when not even the ellipsis fits.
pub fn truncate_to_width<T: TextRenderer + ?Sized>(
    text_r: &mut T,
    text: &str,
    size_px: f32,
    max_width: f64,
) -> GeoCamResult<String> {
    if fits(text_r, text, size_px, max_width)? {
        return Ok(text.to_string());
    }
    let mut head = text.trim_end().to_string();
    while head.pop().is_some() {
        let trimmed = head.trim_end();
        if trimmed.is_empty() {
            break;
        }
        let candidate = format!("{trimmed}{ELLIPSIS}");
        if fits(text_r, &candidate, size_px, max_width)? {
            return Ok(candidate);
        }
    }
    if fits(text_r, ELLIPSIS, size_px, max_width)? {
        Ok(ELLIPSIS.to_string())
    } else {
        Ok(String::new())
    }
}

/// Greedy word wrap into at most `max_lines` lines.
///
/// Words wider than the column are broken by characters. When the text needs more lines, the
/// last kept line is ellipsized to fit.
pub fn wrap_lines<T: TextRenderer + ?Sized>(
    text_r: &mut T,
    text: &str,
    size_px: f32,
    max_width: f64,
    max_lines: usize,
) -> GeoCamResult<Vec<String>> {
    if max_lines == 0 || max_width <= 0.0 {
        return Ok(Vec::new());
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if lines.len() > max_lines {
            break;
        }
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(text_r, &candidate, size_px, max_width)? {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fits(text_r, word, size_px, max_width)? {
            current = word.to_string();
            continue;
        }

        for ch in word.chars() {
            let mut grown = current.clone();
            grown.push(ch);
            if fits(text_r, &grown, size_px, max_width)? {
                current = grown;
                continue;
            }
            let single = ch.to_string();
            if !fits(text_r, &single, size_px, max_width)? {
                // A single glyph wider than the column: nothing can be drawn.
                return Ok(Vec::new());
            }
            if !current.is_empty() {
                lines.push(std::mem::replace(&mut current, single));
            } else {
                current = single;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        let last = lines.pop().unwrap_or_default();
        lines.push(ellipsize(text_r, &last, size_px, max_width)?);
    }
    Ok(lines)
}

/// Append an ellipsis to `line`, dropping trailing characters until the result fits.
fn ellipsize<T: TextRenderer + ?Sized>(
    text_r: &mut T,
    line: &str,
    size_px: f32,
    max_width: f64,
) -> GeoCamResult<String> {
    let mut head = line.trim_end().to_string();
    loop {
        let candidate = format!("{}{ELLIPSIS}", head.trim_end());
        if fits(text_r, &candidate, size_px, max_width)? {
            return Ok(candidate);
        }
        if head.pop().is_none() {
            return Ok(String::new());
        }
    }
}

fn fits<T: TextRenderer + ?Sized>(
    text_r: &mut T,
    text: &str,
    size_px: f32,
    max_width: f64,
) -> GeoCamResult<bool> {
    Ok(f64::from(text_r.measure(text, size_px)?) <= max_width)
}

#[cfg(test)]
#[path = "../../tests/unit/footer/text.rs"]
mod tests;
