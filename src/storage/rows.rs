//! Table layouts of the harvested record types.

use rusqlite::types::Value;

use super::sink::{Column, ColumnType, TableRow};
use crate::domain::{BacklinkRecord, EnrichedRecord, RefdomainRecord};

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn opt_real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

fn opt_bool(value: Option<bool>) -> Value {
    value.map_or(Value::Null, |b| Value::Integer(i64::from(b)))
}

impl TableRow for EnrichedRecord {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("thread_id", ColumnType::Integer),
            Column::new("subject", ColumnType::Text),
            Column::new("message_count", ColumnType::Integer),
            Column::new("deal_id", ColumnType::Integer),
            Column::new("add_time", ColumnType::Timestamp),
            Column::new("snippet", ColumnType::Text),
            Column::new("to_emails", ColumnType::Text),
            Column::new("from_emails", ColumnType::Text),
            Column::new("cc_emails", ColumnType::Text),
            Column::new("bcc_emails", ColumnType::Text),
        ];
        COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        // Unparseable timestamps are kept verbatim rather than dropped.
        let add_time = match self.created_at_utc() {
            Some(ts) => Value::Text(ts.to_rfc3339()),
            None if self.created_at.trim().is_empty() => Value::Null,
            None => text(&self.created_at),
        };

        vec![
            Value::Integer(self.thread_id.0),
            text(&self.subject),
            Value::Integer(i64::from(self.message_count)),
            opt_int(self.deal_id.map(|d| d.0)),
            add_time,
            text(&self.snippet),
            text(&self.to_emails),
            text(&self.from_emails),
            text(&self.cc_emails),
            text(&self.bcc_emails),
        ]
    }
}

impl TableRow for BacklinkRecord {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("domain", ColumnType::Text),
            Column::new("url_from", ColumnType::Text),
            Column::new("url_to", ColumnType::Text),
            Column::new("anchor", ColumnType::Text),
            Column::new("DR", ColumnType::Real),
            Column::new("UR", ColumnType::Real),
            Column::new("domain_traffic", ColumnType::Integer),
            Column::new("referring_domains", ColumnType::Integer),
            Column::new("linked_domains", ColumnType::Integer),
            Column::new("page_traffic", ColumnType::Integer),
            Column::new("keywords", ColumnType::Integer),
            Column::new("external_links", ColumnType::Integer),
            Column::new("is_dofollow", ColumnType::Boolean),
            Column::new("is_nofollow", ColumnType::Boolean),
            Column::new("is_ugc", ColumnType::Boolean),
            Column::new("first_seen", ColumnType::Timestamp),
        ];
        COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.domain),
            opt_text(self.url_from.as_deref()),
            opt_text(self.url_to.as_deref()),
            opt_text(self.anchor.as_deref()),
            opt_real(self.domain_rating),
            opt_real(self.url_rating),
            opt_int(self.domain_traffic),
            opt_int(self.referring_domains),
            opt_int(self.linked_domains),
            opt_int(self.page_traffic),
            opt_int(self.keywords),
            opt_int(self.external_links),
            opt_bool(self.is_dofollow),
            opt_bool(self.is_nofollow),
            opt_bool(self.is_ugc),
            opt_text(self.first_seen.as_deref()),
        ]
    }
}

impl TableRow for RefdomainRecord {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("domain", ColumnType::Text),
            Column::new("refdomains_25+", ColumnType::Integer),
            Column::new("refdomains_80+", ColumnType::Integer),
        ];
        COLUMNS
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.domain),
            Value::Integer(self.refdomains_25_plus),
            Value::Integer(self.refdomains_80_plus),
        ]
    }
}
