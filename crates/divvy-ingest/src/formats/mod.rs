mod common;
mod douyin;
mod xhs;

pub use douyin::DouyinExportParser;
pub use xhs::XhsExportParser;

pub(crate) use common::{parse_export_rows, ColumnSpec};
