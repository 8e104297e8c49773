//! Parsing of trim start and end times.

use reelsmith_media::job::Seconds;

use crate::error::InputError;

/// Named end-time presets offered as buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndPreset {
    /// Open-ended trim.
    ToEnd,
    Plus10s,
    Plus30s,
    Plus1m,
    Plus2m,
    Plus5m,
    Plus10m,
}

impl EndPreset {
    pub const RELATIVE: [Self; 6] = [
        Self::Plus10s,
        Self::Plus30s,
        Self::Plus1m,
        Self::Plus2m,
        Self::Plus5m,
        Self::Plus10m,
    ];

    /// Offset added to the start time; `None` for [`EndPreset::ToEnd`].
    #[must_use]
    pub fn offset(self) -> Option<Seconds> {
        match self {
            Self::ToEnd => None,
            Self::Plus10s => Some(10.0),
            Self::Plus30s => Some(30.0),
            Self::Plus1m => Some(60.0),
            Self::Plus2m => Some(120.0),
            Self::Plus5m => Some(300.0),
            Self::Plus10m => Some(600.0),
        }
    }

    /// Stable key used for button labels and callback data.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::ToEnd => "end_of_video",
            Self::Plus10s => "plus_10s",
            Self::Plus30s => "plus_30s",
            Self::Plus1m => "plus_1m",
            Self::Plus2m => "plus_2m",
            Self::Plus5m => "plus_5m",
            Self::Plus10m => "plus_10m",
        }
    }
}

/// Parse `15`, `1:30`, or `0:01:30` (fractional seconds allowed in the last
/// field) into seconds.
pub fn parse_time(input: &str) -> Result<Seconds, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(InputError::InvalidTime);
    }

    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() > 3 {
        return Err(InputError::InvalidTime);
    }

    let mut total = 0.0;
    for part in &parts {
        let value = parse_field(part)?;
        total = total * 60.0 + value;
    }
    Ok(total)
}

fn parse_field(field: &str) -> Result<Seconds, InputError> {
    let field = field.trim();
    let (negative, digits) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field),
    };
    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(InputError::InvalidTime);
    }
    let value: Seconds = digits.parse().map_err(|_| InputError::InvalidTime)?;
    if negative && value > 0.0 {
        return Err(InputError::NegativeTime);
    }
    Ok(value)
}

/// Resolve free-text end input against `start`.
///
/// `+N` with an optional unit (`s`, `sec`, `m`, `min`) is relative to the
/// start; anything else goes through [`parse_time`]. A `+` prefix followed by
/// anything else is rejected rather than reparsed.
pub fn parse_end(input: &str, start: Seconds) -> Result<Seconds, InputError> {
    let input = input.trim();
    let end = match input.strip_prefix('+') {
        Some(relative) => start + parse_relative(relative)?,
        None => parse_time(input)?,
    };
    ensure_after(end, start)
}

/// End time for a preset button. `None` means trim to the end.
pub fn resolve_preset(preset: EndPreset, start: Seconds) -> Result<Option<Seconds>, InputError> {
    match preset.offset() {
        None => Ok(None),
        Some(offset) => ensure_after(start + offset, start).map(Some),
    }
}

fn ensure_after(end: Seconds, start: Seconds) -> Result<Seconds, InputError> {
    if end > start {
        Ok(end)
    } else {
        Err(InputError::EndNotAfterStart { start })
    }
}

fn parse_relative(text: &str) -> Result<Seconds, InputError> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    if number.is_empty() || number.chars().filter(|c| *c == '.').count() > 1 {
        return Err(InputError::InvalidTime);
    }
    let value: Seconds = number.parse().map_err(|_| InputError::InvalidTime)?;
    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" => 1.0,
        "m" | "min" => 60.0,
        _ => return Err(InputError::InvalidTime),
    };
    Ok(value * multiplier)
}
