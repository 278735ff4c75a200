//! Archive file names, which double as the only index of past exports.
//!
//! A name is `[slim_]<slug>_<date>.zip`. Decoding splits on `_`, so a slug
//! that itself contains `_` cannot be recovered: `my_pack_<date>.zip`
//! decodes as a slim export of `pack`, and anything with more segments is
//! ignored. Listing code treats undecodable names as foreign files.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Default date format appended to archive names (minute resolution).
pub const DEFAULT_FILE_DATE_FORMAT: &str = "%m-%d-%Y-%H-%M";

/// Marker prefixed to slim archive names.
pub const SLIM_PREFIX: &str = "slim";

/// Extension of produced archives.
pub const ARCHIVE_EXTENSION: &str = ".zip";

const SEPARATOR: char = '_';

/// Metadata recovered from an archive file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFilename {
    /// Package slug.
    pub slug: String,
    /// When the archive was produced.
    pub exported_on: DateTime<Local>,
    /// Whether this is a slim archive.
    pub is_slim: bool,
}

/// Build an archive file name stamped with the current local time.
#[must_use]
pub fn encode(slug: &str, date_format: &str, is_slim: bool) -> String {
    encode_at(slug, date_format, is_slim, Local::now())
}

/// Build an archive file name stamped with `at`.
#[must_use]
pub fn encode_at(slug: &str, date_format: &str, is_slim: bool, at: DateTime<Local>) -> String {
    let mut name = String::new();
    if is_slim {
        name.push_str(SLIM_PREFIX);
        name.push(SEPARATOR);
    }
    name.push_str(slug);
    name.push(SEPARATOR);
    name.push_str(&at.format(date_format).to_string());
    name.push_str(ARCHIVE_EXTENSION);
    name
}

/// Strip the archive extension, if present.
#[must_use]
pub fn stem(file_name: &str) -> &str {
    file_name
        .strip_suffix(ARCHIVE_EXTENSION)
        .unwrap_or(file_name)
}

/// Recover slug, date and slim flag from an archive file name.
///
/// Returns `None` when the name does not split into two or three segments
/// or the date segment does not match `date_format`. The first segment of a
/// three-part name is assumed to be the slim marker and is not checked.
#[must_use]
pub fn decode(file_name: &str, date_format: &str) -> Option<DecodedFilename> {
    let pieces: Vec<&str> = stem(file_name).split(SEPARATOR).collect();
    let (slug, date, is_slim) = match pieces.as_slice() {
        [slug, date] => (*slug, *date, false),
        [_, slug, date] => (*slug, *date, true),
        _ => return None,
    };
    let exported_on = parse_date(date, date_format)?;
    Some(DecodedFilename {
        slug: slug.to_string(),
        exported_on,
        is_slim,
    })
}

/// Formats without a time part stamp the archive at midnight.
fn parse_date(value: &str, date_format: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value, date_format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, date_format)
                .ok()?
                .and_hms_opt(0, 0, 0)
        })?;
    Local.from_local_datetime(&naive).earliest()
}
