use crate::domain::model::{CellValue, Row, Table};
use crate::utils::error::Result;
use crate::utils::validation::validate_delimiter;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::Value;

pub const DEFAULT_DELIMITER: char = ',';

/// 儲存格轉為輸出文字，null 輸出為空字串
pub fn cell_to_string(value: &CellValue) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 僅在包含分隔符號、引號或換行（`\n`、`\r`）時加上引號，內部引號加倍
pub fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains(['"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_line(out: &mut String, fields: &[String], delimiter: char) {
    // 單欄空值寫成 `""`，否則讀回時會被當成空白行略過
    if let [only] = fields {
        if only.is_empty() {
            out.push_str("\"\"\n");
            return;
        }
    }
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(delimiter);
        }
        out.push_str(&quote_field(field, delimiter));
    }
    out.push('\n');
}

/// 依欄位順序輸出表頭與每一列，每行結尾都有換行
pub fn to_csv(table: &Table, delimiter: char) -> String {
    let mut out = String::new();
    write_line(&mut out, &table.columns, delimiter);

    for row in &table.rows {
        let fields: Vec<String> = table
            .columns
            .iter()
            .map(|column| row.get(column).map(cell_to_string).unwrap_or_default())
            .collect();
        write_line(&mut out, &fields, delimiter);
    }

    out
}

/// 解析 CSV 文字：第一行為表頭，其餘非空白行各為一列。
///
/// 支援引號欄位（含分隔符號、換行與加倍的引號），與 [`to_csv`] 互為反向。
/// 欄位不足的列以 null 補齊，多出的欄位會被忽略。
pub fn parse_csv(text: &str, delimiter: char) -> Result<Table> {
    validate_delimiter("delimiter", delimiter)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = unique_columns(headers.iter());
    if columns.is_empty() {
        return Ok(Table::default());
    }

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        let start = reader.position().byte() as usize;
        if !reader.read_record(&mut record)? {
            break;
        }
        let end = reader.position().byte() as usize;
        if is_blank_line(text, start, end) {
            continue;
        }

        let mut row = Row::new();
        for (index, column) in columns.iter().enumerate() {
            let value = record
                .get(index)
                .map(|field| Value::String(field.to_string()))
                .unwrap_or(Value::Null);
            row.insert(column.clone(), value);
        }
        rows.push(row);
    }

    tracing::debug!("Parsed CSV: {} columns, {} rows", columns.len(), rows.len());
    Ok(Table::new(columns, rows))
}

/// 以原始文字判斷空白行，`""` 這類明確的空值不算
fn is_blank_line(text: &str, start: usize, end: usize) -> bool {
    text.as_bytes()
        .get(start..end.min(text.len()))
        .map(|raw| raw.iter().all(u8::is_ascii_whitespace))
        .unwrap_or(false)
}

/// 重複的表頭加上 `.1`、`.2` 後綴，讓欄位名稱保持唯一
fn unique_columns<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for header in headers {
        let mut name = header.to_string();
        let mut n = 1;
        while columns.contains(&name) {
            name = format!("{}.{}", header, n);
            n += 1;
        }
        if name != header {
            tracing::warn!("Duplicate column '{}' renamed to '{}'", header, name);
        }
        columns.push(name);
    }
    columns
}

/// 表頭行中 `;` 比 `,` 多時視為分號分隔
pub fn sniff_delimiter(text: &str) -> char {
    let first = text.lines().next().unwrap_or("");
    if first.matches(';').count() > first.matches(',').count() {
        ';'
    } else {
        ','
    }
}
