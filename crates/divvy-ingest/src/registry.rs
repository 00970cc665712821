use crate::errors::{ParserAttempt, ParserError};
use crate::formats::{DouyinExportParser, XhsExportParser};
use crate::model::ParsedExport;

pub trait MetricsExportParser {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<ParsedExport, ParserError>;
}

pub fn parse_metrics_export(content: &str) -> Result<ParsedExport, ParserError> {
    let douyin = DouyinExportParser;
    let xhs = XhsExportParser;
    let parsers: [&dyn MetricsExportParser; 2] = [&douyin, &xhs];
    parse_with_parsers(content, &parsers)
}

pub fn parse_with_parsers(
    content: &str,
    parsers: &[&dyn MetricsExportParser],
) -> Result<ParsedExport, ParserError> {
    let mut attempts = Vec::new();

    for parser in parsers {
        match parser.parse(content) {
            Ok(parsed) => return Ok(parsed),
            Err(ParserError::FormatMismatch { reason, .. }) => {
                attempts.push(ParserAttempt::new(parser.name(), reason));
            }
            Err(ParserError::MissingColumn { column, .. }) => {
                attempts.push(ParserAttempt::new(
                    parser.name(),
                    format!("missing required column '{column}'"),
                ));
            }
            Err(err) => return Err(err),
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}
