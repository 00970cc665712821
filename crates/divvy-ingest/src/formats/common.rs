use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::errors::ParserError;
use crate::model::MetricRow;

/// A required export column: the canonical name plus the header spellings the
/// platforms (and hand-translated re-exports) use for it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

/// Maps each spec to its index in the header row. Every spec is required;
/// a miss is reported against the canonical name so registry fallback can
/// show which column disqualified the format.
fn resolve_columns(
    parser: &'static str,
    header: &StringRecord,
    specs: &[ColumnSpec],
) -> Result<Vec<usize>, ParserError> {
    let mut indices = Vec::with_capacity(specs.len());
    for spec in specs {
        let found = header.iter().position(|cell| {
            let trimmed = cell.trim();
            spec.aliases
                .iter()
                .any(|alias| trimmed.eq_ignore_ascii_case(alias))
        });
        match found {
            Some(idx) => indices.push(idx),
            None => {
                return Err(ParserError::MissingColumn {
                    parser,
                    column: spec.canonical,
                })
            }
        }
    }
    Ok(indices)
}

/// Shared CSV walk for both platform exports. `specs` must list the seven
/// required columns in canonical order: title, published_at, plays, likes,
/// comments, shares, collects. Extra export columns (genre, review status,
/// completion rates, ...) are ignored.
pub(crate) fn parse_export_rows(
    parser: &'static str,
    content: &str,
    specs: &[ColumnSpec; 7],
) -> Result<Vec<MetricRow>, ParserError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = records
        .next()
        .ok_or(ParserError::FormatMismatch {
            parser,
            reason: "file missing header row".to_string(),
        })?
        .map_err(|err| ParserError::Csv {
            parser,
            source: err,
        })?;

    let indices = resolve_columns(parser, &header, specs)?;
    let min_len = indices.iter().copied().max().unwrap_or(0) + 1;

    let mut rows = Vec::new();
    for (row_idx, record) in records.enumerate() {
        let record = record.map_err(|err| ParserError::Csv {
            parser,
            source: err,
        })?;
        let line_index = row_idx + 2; // header is line 1

        if record.len() < min_len {
            return Err(ParserError::DataRow {
                parser,
                line_index,
                message: format!(
                    "expected at least {min_len} columns but found {}",
                    record.len()
                ),
            });
        }

        let cell = |slot: usize| record.get(indices[slot]).unwrap_or("");

        rows.push(MetricRow {
            title: parse_title(parser, cell(0), line_index)?,
            published_at: parse_published_at(parser, cell(1), line_index, specs[1].canonical)?,
            plays: parse_count(parser, cell(2), line_index, specs[2].canonical)?,
            likes: parse_count(parser, cell(3), line_index, specs[3].canonical)?,
            comments: parse_count(parser, cell(4), line_index, specs[4].canonical)?,
            shares: parse_count(parser, cell(5), line_index, specs[5].canonical)?,
            collects: parse_count(parser, cell(6), line_index, specs[6].canonical)?,
        });
    }

    if rows.is_empty() {
        return Err(ParserError::EmptyData { parser });
    }

    Ok(rows)
}

fn parse_title(
    parser: &'static str,
    value: &str,
    line_index: usize,
) -> Result<String, ParserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParserError::DataRow {
            parser,
            line_index,
            message: "title column was empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Parses an engagement counter. Exports use plain integers, but re-exports
/// sometimes carry thousands separators or the platform's 万 (×10 000)
/// shorthand; blank cells mean zero.
fn parse_count(
    parser: &'static str,
    value: &str,
    line_index: usize,
    column: &'static str,
) -> Result<i64, ParserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(0);
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ',' && *c != '，')
        .collect();

    let parsed = if let Some(base) = cleaned.strip_suffix('万') {
        base.trim()
            .parse::<f64>()
            .map(|v| (v * 10_000.0).round() as i64)
    } else if let Ok(int) = cleaned.parse::<i64>() {
        Ok(int)
    } else {
        cleaned.parse::<f64>().map(|v| v.round() as i64)
    };

    match parsed {
        Ok(count) if count >= 0 => Ok(count),
        Ok(count) => Err(ParserError::DataRow {
            parser,
            line_index,
            message: format!("column '{column}' had negative count {count}"),
        }),
        Err(err) => Err(ParserError::DataRow {
            parser,
            line_index,
            message: format!("failed to parse column '{column}' as count: {err}"),
        }),
    }
}

fn parse_published_at(
    parser: &'static str,
    value: &str,
    line_index: usize,
    column: &'static str,
) -> Result<NaiveDateTime, ParserError> {
    static DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%Y年%m月%d日%H时%M分%S秒",
    ];
    static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日"];

    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }

    Err(ParserError::DataRow {
        parser,
        line_index,
        message: format!("invalid timestamp '{trimmed}' in column '{column}'"),
    })
}
