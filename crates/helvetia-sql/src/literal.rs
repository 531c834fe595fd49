//! Inline SQL literals for the fast bulk path
//!
//! `escape_value` renders a value straight into statement text:
//! - absent values become `NULL`
//! - strings are single-quoted with embedded `'` doubled
//! - datetimes are quoted as `YYYY-MM-DD HH:MM:SS`
//! - everything else uses its plain display form
//!
//! Backslashes are not escaped, so sessions running the fast path need
//! `NO_BACKSLASH_ESCAPES` for text containing them.
//!
//! The parser half reads the same grammar back. It exists so the escaping can
//! be round-trip tested and so the embedded client can apply raw inserts.

use crate::error::{SqlError, SqlResult};
use crate::statement::TableRef;
use crate::value::{SqlValue, DATETIME_FORMAT, DATE_FORMAT};

/// Render one value as an inline literal
pub fn escape_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Text(s) => escape_str(s),
        SqlValue::DateTime(dt) => format!("'{}'", dt.format(DATETIME_FORMAT)),
        SqlValue::Date(d) => format!("'{}'", d.format(DATE_FORMAT)),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
    }
}

/// Quote a string, doubling embedded single quotes
pub fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Render a value tuple: `(v1, v2, ...)`
pub fn escape_tuple(values: &[SqlValue]) -> String {
    let parts: Vec<String> = values.iter().map(escape_value).collect();
    format!("({})", parts.join(", "))
}

/// A raw `INSERT [IGNORE] INTO ... VALUES ...` statement, parsed
#[derive(Debug, Clone, PartialEq)]
pub struct RawInsert {
    pub ignore: bool,
    pub table: TableRef,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Parse a tuple list such as `(1, 'a''b', NULL),\n(2, 'c', NULL)`.
///
/// Quoted literals come back as `Text`; datetimes are therefore text in
/// `YYYY-MM-DD HH:MM:SS` form.
pub fn parse_values(input: &str) -> SqlResult<Vec<Vec<SqlValue>>> {
    let mut cursor = Cursor::new(input);
    let rows = cursor.tuple_list()?;
    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(cursor.error("trailing input after value list"));
    }
    Ok(rows)
}

/// Parse a whole raw insert statement
pub fn parse_insert(sql: &str) -> SqlResult<RawInsert> {
    let mut cursor = Cursor::new(sql);
    cursor.expect_keyword("INSERT")?;
    let ignore = cursor.eat_keyword("IGNORE");
    cursor.expect_keyword("INTO")?;
    let table = cursor.table_ref()?;

    cursor.expect_char('(')?;
    let mut columns = vec![cursor.ident()?];
    while cursor.eat_char(',') {
        columns.push(cursor.ident()?);
    }
    cursor.expect_char(')')?;
    cursor.expect_keyword("VALUES")?;

    let rows = cursor.tuple_list()?;
    cursor.skip_ws();
    cursor.eat_char(';');
    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(cursor.error("trailing input after insert"));
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
        return Err(SqlError::Parse(format!(
            "tuple has {} values, expected {}",
            bad.len(),
            columns.len()
        )));
    }

    Ok(RawInsert {
        ignore,
        table,
        columns,
        rows,
    })
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(&self, msg: &str) -> SqlError {
        SqlError::Parse(format!("{} at offset {}", msg, self.pos))
    }

    fn eat_char(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, expected: char) -> SqlResult<()> {
        if self.eat_char(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if rest
            .get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        {
            let boundary = rest[keyword.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric() && c != '_');
            if boundary {
                self.pos += keyword.len();
                return true;
            }
        }
        false
    }

    fn expect_keyword(&mut self, keyword: &str) -> SqlResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", keyword)))
        }
    }

    fn ident(&mut self) -> SqlResult<String> {
        self.skip_ws();
        if self.peek() == Some('`') {
            self.bump();
            let mut out = String::new();
            loop {
                match self.bump() {
                    Some('`') if self.peek() == Some('`') => {
                        self.bump();
                        out.push('`');
                    }
                    Some('`') => return Ok(out),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated identifier")),
                }
            }
        }

        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn table_ref(&mut self) -> SqlResult<TableRef> {
        let first = self.ident()?;
        if self.peek() == Some('.') {
            self.bump();
            let name = self.ident()?;
            Ok(TableRef::qualified(first, name))
        } else {
            Ok(TableRef::new(first))
        }
    }

    fn tuple_list(&mut self) -> SqlResult<Vec<Vec<SqlValue>>> {
        let mut rows = vec![self.tuple()?];
        while self.eat_char(',') {
            rows.push(self.tuple()?);
        }
        Ok(rows)
    }

    fn tuple(&mut self) -> SqlResult<Vec<SqlValue>> {
        self.expect_char('(')?;
        let mut values = vec![self.literal()?];
        while self.eat_char(',') {
            values.push(self.literal()?);
        }
        self.expect_char(')')?;
        Ok(values)
    }

    fn literal(&mut self) -> SqlResult<SqlValue> {
        self.skip_ws();
        match self.peek() {
            Some('\'') => self.quoted().map(SqlValue::Text),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            _ if self.eat_keyword("NULL") => Ok(SqlValue::Null),
            _ => Err(self.error("expected literal")),
        }
    }

    fn quoted(&mut self) -> SqlResult<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.bump();
                    out.push('\'');
                }
                Some('\'') => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }

    fn number(&mut self) -> SqlResult<SqlValue> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            self.bump();
        }
        let text = &self.input[start..self.pos];
        if let Ok(i) = text.parse::<i64>() {
            return Ok(SqlValue::Int(i));
        }
        text.parse::<f64>()
            .map(SqlValue::Float)
            .map_err(|_| SqlError::Parse(format!("bad numeric literal '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_escape_rules() {
        assert_eq!(escape_value(&SqlValue::Null), "NULL");
        assert_eq!(escape_value(&SqlValue::Text("it's".into())), "'it''s'");
        assert_eq!(escape_value(&SqlValue::Int(42)), "42");
        let dt = NaiveDate::from_ymd_opt(2017, 9, 25)
            .and_then(|d| d.and_hms_opt(7, 8, 9))
            .unwrap();
        assert_eq!(escape_value(&SqlValue::DateTime(dt)), "'2017-09-25 07:08:09'");
    }

    #[test]
    fn test_quote_round_trip() {
        for original in ["O'Brien", "''", "'", "a'b'c''d", "no quotes", "", "多语言 'x'"] {
            let sql = escape_tuple(&[SqlValue::Text(original.to_string()), SqlValue::Null]);
            let rows = parse_values(&sql).unwrap();
            assert_eq!(rows, vec![vec![SqlValue::Text(original.to_string()), SqlValue::Null]]);
        }
    }

    #[test]
    fn test_parse_insert() {
        let sql = "INSERT IGNORE INTO `read_keyspace`.`read`\n (`id`, `uid`, `commentDetail`) VALUES (1, 'u1', NULL),\n(2, 'u2', 'nice, isn''t it')";
        let parsed = parse_insert(sql).unwrap();
        assert!(parsed.ignore);
        assert_eq!(parsed.table, TableRef::qualified("read_keyspace", "read"));
        assert_eq!(parsed.columns, vec!["id", "uid", "commentDetail"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1][2], SqlValue::Text("nice, isn't it".into()));
    }

    #[test]
    fn test_parse_rejects_arity_mismatch() {
        let sql = "INSERT INTO t (a, b) VALUES (1, 2), (3)";
        assert!(matches!(parse_insert(sql), Err(SqlError::Parse(_))));
    }

    #[test]
    fn test_unterminated_literal() {
        assert!(parse_values("(1, 'abc)").is_err());
    }
}
