use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed duration \"{0}\", expected something like \"2h 30m\"")]
pub struct MalformedDuration(pub String);

/// Converts Gizmo's "Xh Ym" duration text into a total number of minutes.
///
/// Either component may be missing ("5h", "45m"), but at least one must be
/// present. Each component may appear at most once and hours must come first.
pub fn to_minutes(text: &str) -> Result<u64, MalformedDuration> {
    let malformed = || MalformedDuration(text.to_owned());

    let mut hours = None;
    let mut minutes = None;
    for token in text.split_whitespace() {
        if let Some(value) = token.strip_suffix('h') {
            if hours.is_some() || minutes.is_some() {
                return Err(malformed());
            }
            hours = Some(value.parse::<u64>().map_err(|_| malformed())?);
        } else if let Some(value) = token.strip_suffix('m') {
            if minutes.is_some() {
                return Err(malformed());
            }
            minutes = Some(value.parse::<u64>().map_err(|_| malformed())?);
        } else {
            return Err(malformed());
        }
    }

    if hours.is_none() && minutes.is_none() {
        return Err(malformed());
    }
    hours
        .unwrap_or(0)
        .checked_mul(60)
        .and_then(|total| total.checked_add(minutes.unwrap_or(0)))
        .ok_or_else(malformed)
}
