use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Human readable day used on grade reports, e.g. `02 January 2025`.
pub(crate) fn format_report_date(value: PrimitiveDateTime) -> String {
    let format = format_description!("[day] [month repr:long] [year]");
    value.format(&format).unwrap_or_else(|_| value.date().to_string())
}
