use crate::core::csv_codec;
use crate::domain::model::{
    AnalyzeResponse, ApplyCorrectionsRequest, CellValue, Correction, CorrectionEntry, Issue, Row,
    Table,
};
use crate::utils::error::{FixError, Result};

/// `apply_all` 的結果：成功套用的數量，以及無法定位而略過的問題
#[derive(Debug, Default)]
pub struct ApplyAllReport {
    pub applied: usize,
    pub skipped: Vec<(Issue, FixError)>,
}

/// 目前載入的表格、尚未處理的問題與已套用的修正紀錄。
///
/// 問題以在清單中的位置識別；任何移除問題的操作之後，索引會重新編排，
/// 呼叫端不應跨越修改操作保留舊索引。
#[derive(Debug, Default)]
pub struct CorrectionSession {
    table: Table,
    issues: Vec<Issue>,
    corrections: Vec<Correction>,
}

impl CorrectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整批取代目前狀態並清空修正紀錄
    pub fn load(&mut self, rows: Vec<Row>, columns: Vec<String>, issues: Vec<Issue>) {
        tracing::debug!(
            "Loading table: {} rows, {} columns, {} issues",
            rows.len(),
            columns.len(),
            issues.len()
        );
        self.table = Table::new(columns, rows);
        self.issues = issues;
        self.corrections.clear();
    }

    pub fn load_analysis(&mut self, response: AnalyzeResponse) {
        let columns = response.resolved_columns();
        self.load(response.data, columns, response.issues);
    }

    pub fn load_table(&mut self, table: Table, issues: Vec<Issue>) {
        self.load(table.rows, table.columns, issues);
    }

    pub fn columns(&self) -> &[String] {
        &self.table.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.table.rows
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn has_fixable(&self) -> bool {
        self.issues.iter().any(Issue::has_suggestion)
    }

    /// 指向同一儲存格的所有未處理問題
    pub fn issues_at(&self, row: usize, column: usize) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(move |issue| issue.row == row && issue.column == column)
    }

    pub fn resolve_column(&self, column: usize) -> Result<&str> {
        self.table
            .columns
            .get(column)
            .map(String::as_str)
            .ok_or(FixError::ColumnNotFound {
                column,
                available: self.table.columns.len(),
            })
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<Option<&CellValue>> {
        let name = self.resolve_column(column)?;
        let row_data = self.table.rows.get(row).ok_or(FixError::RowNotFound {
            row,
            available: self.table.rows.len(),
        })?;
        Ok(row_data.get(name))
    }

    /// 寫入建議值並回傳修正紀錄；失敗時不改變任何狀態
    fn write_suggestion(&mut self, issue: &Issue, index: usize) -> Result<Correction> {
        let new_value = issue
            .suggestion()
            .cloned()
            .ok_or(FixError::NoSuggestion { index })?;
        let column_name = self.resolve_column(issue.column)?.to_string();
        let available = self.table.rows.len();
        let row = self
            .table
            .rows
            .get_mut(issue.row)
            .ok_or(FixError::RowNotFound {
                row: issue.row,
                available,
            })?;

        row.insert(column_name.clone(), new_value.clone());

        Ok(Correction {
            row: issue.row,
            column: issue.column,
            column_name,
            old_value: issue.value.clone(),
            new_value,
        })
    }

    pub fn apply_one(&mut self, index: usize) -> Result<&Correction> {
        let issue = self
            .issues
            .get(index)
            .cloned()
            .ok_or(FixError::IssueNotFound {
                index,
                outstanding: self.issues.len(),
            })?;

        let correction = self.write_suggestion(&issue, index)?;
        tracing::debug!(
            "Applied {} at row {}, column '{}'",
            issue.issue_type,
            correction.row,
            correction.column_name
        );

        self.issues.remove(index);
        self.corrections.push(correction);
        Ok(&self.corrections[self.corrections.len() - 1])
    }

    /// 依原順序套用所有有建議值的問題；沒有建議值或無法定位的問題保留在清單中
    pub fn apply_all(&mut self) -> ApplyAllReport {
        let mut report = ApplyAllReport::default();
        let issues = std::mem::take(&mut self.issues);
        let mut remaining = Vec::with_capacity(issues.len());

        for (index, issue) in issues.into_iter().enumerate() {
            if !issue.has_suggestion() {
                remaining.push(issue);
                continue;
            }

            match self.write_suggestion(&issue, index) {
                Ok(correction) => {
                    self.corrections.push(correction);
                    report.applied += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping issue {}: {}", index, e);
                    remaining.push(issue.clone());
                    report.skipped.push((issue, e));
                }
            }
        }

        self.issues = remaining;
        tracing::info!(
            "Applied {} corrections, {} skipped, {} issues remaining",
            report.applied,
            report.skipped.len(),
            self.issues.len()
        );
        report
    }

    pub fn to_csv(&self, delimiter: char) -> String {
        csv_codec::to_csv(&self.table, delimiter)
    }

    pub fn correction_request(&self) -> ApplyCorrectionsRequest {
        ApplyCorrectionsRequest {
            data: self.table.rows.clone(),
            corrections: self.corrections.iter().map(CorrectionEntry::from).collect(),
            columns: self.table.columns.clone(),
        }
    }

    /// 採用伺服器回傳的修正後資料；欄位、問題與修正紀錄維持不變
    pub fn replace_rows(&mut self, rows: Vec<Row>) {
        self.table.rows = rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::IssueType;
    use serde_json::{json, Value};

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    fn issue(row: usize, column: usize, issue_type: IssueType, suggested: Option<&str>) -> Issue {
        Issue {
            row,
            column,
            column_name: None,
            issue_type,
            value: Value::Null,
            suggested_value: suggested.map(|s| json!(s)),
            description: None,
        }
    }

    fn sample_session() -> CorrectionSession {
        let mut session = CorrectionSession::new();
        session.load(
            vec![
                row(&[("Nome", "ana"), ("CPF", "12345678909")]),
                row(&[("Nome", "BIA"), ("CPF", "11111111111")]),
            ],
            vec!["Nome".into(), "CPF".into()],
            vec![
                issue(0, 0, IssueType::TextCase, Some("ANA")),
                issue(1, 1, IssueType::InvalidCpf, None),
                issue(0, 1, IssueType::CpfFormat, Some("123.456.789-09")),
            ],
        );
        session
    }

    #[test]
    fn test_apply_one_writes_value_and_records_correction() {
        let mut session = CorrectionSession::new();
        let mut issue = issue(0, 1, IssueType::TextCase, Some("y"));
        issue.value = json!("x");
        issue.column_name = Some("B".into());
        session.load(
            vec![row(&[("A", "1"), ("B", "x")])],
            vec!["A".into(), "B".into()],
            vec![issue],
        );

        let correction = session.apply_one(0).unwrap().clone();
        assert_eq!(correction.column_name, "B");
        assert_eq!(correction.old_value, json!("x"));
        assert_eq!(correction.new_value, json!("y"));
        assert!(session.issues().is_empty());
        assert_eq!(session.to_csv(','), "A,B\n1,y\n");
    }

    #[test]
    fn test_apply_one_reindexes_outstanding_list() {
        let mut session = sample_session();
        session.apply_one(0).unwrap();

        assert_eq!(session.issues().len(), 2);
        assert_eq!(session.issues()[0].issue_type, IssueType::InvalidCpf);
        session.apply_one(1).unwrap();
        assert_eq!(session.rows()[0]["CPF"], json!("123.456.789-09"));
        assert_eq!(session.corrections().len(), 2);
    }

    #[test]
    fn test_apply_one_without_suggestion_is_rejected() {
        let mut session = sample_session();
        let err = session.apply_one(1).unwrap_err();
        assert!(matches!(err, FixError::NoSuggestion { index: 1 }));
        assert_eq!(session.issues().len(), 3);
        assert!(session.corrections().is_empty());
    }

    #[test]
    fn test_apply_one_out_of_range() {
        let mut session = sample_session();
        assert!(matches!(
            session.apply_one(9),
            Err(FixError::IssueNotFound { index: 9, outstanding: 3 })
        ));
    }

    #[test]
    fn test_apply_one_unknown_column_leaves_state_untouched() {
        let mut session = CorrectionSession::new();
        session.load(
            vec![row(&[("A", "1")])],
            vec!["A".into()],
            vec![issue(0, 4, IssueType::NumberFormat, Some("1,0"))],
        );

        let err = session.apply_one(0).unwrap_err();
        assert!(matches!(err, FixError::ColumnNotFound { column: 4, available: 1 }));
        assert_eq!(session.issues().len(), 1);
        assert_eq!(session.rows()[0]["A"], json!("1"));
    }

    #[test]
    fn test_apply_one_missing_row() {
        let mut session = CorrectionSession::new();
        session.load(
            vec![row(&[("A", "1")])],
            vec!["A".into()],
            vec![issue(5, 0, IssueType::NumberFormat, Some("1,0"))],
        );
        assert!(matches!(
            session.apply_one(0),
            Err(FixError::RowNotFound { row: 5, available: 1 })
        ));
    }

    #[test]
    fn test_apply_all_keeps_issues_without_suggestion() {
        let mut session = sample_session();
        let report = session.apply_all();

        assert_eq!(report.applied, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(session.issues().len(), 1);
        assert_eq!(session.issues()[0].issue_type, IssueType::InvalidCpf);
        assert_eq!(session.corrections().len(), 2);
        assert!(!session.has_fixable());
        assert_eq!(
            session.to_csv(','),
            "Nome,CPF\nANA,123.456.789-09\nBIA,11111111111\n"
        );
    }

    #[test]
    fn test_apply_all_skips_unresolvable_and_continues() {
        let mut session = CorrectionSession::new();
        session.load(
            vec![row(&[("A", "x")])],
            vec!["A".into()],
            vec![
                issue(3, 0, IssueType::TextCase, Some("Y")),
                issue(0, 0, IssueType::TextCase, Some("X")),
            ],
        );

        let report = session.apply_all();
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(session.issues().len(), 1);
        assert_eq!(session.issues()[0].row, 3);
        assert_eq!(session.rows()[0]["A"], json!("X"));
    }

    #[test]
    fn test_apply_all_twice_is_noop() {
        let mut session = sample_session();
        session.apply_all();
        let report = session.apply_all();
        assert_eq!(report.applied, 0);
        assert_eq!(session.corrections().len(), 2);
    }

    #[test]
    fn test_load_resets_issues_and_corrections() {
        let mut session = sample_session();
        session.apply_one(0).unwrap();
        assert_eq!(session.corrections().len(), 1);

        session.load(vec![row(&[("X", "1")])], vec!["X".into()], vec![]);
        assert!(session.issues().is_empty());
        assert!(session.corrections().is_empty());
        assert_eq!(session.columns(), ["X".to_string()]);
    }

    #[test]
    fn test_issues_at_and_cell_lookup() {
        let session = sample_session();
        assert_eq!(session.issues_at(0, 1).count(), 1);
        assert_eq!(session.issues_at(1, 0).count(), 0);
        assert_eq!(session.cell(1, 0).unwrap(), Some(&json!("BIA")));
        assert!(session.cell(0, 2).is_err());
        assert!(session.cell(2, 0).is_err());
    }

    #[test]
    fn test_correction_request_payload() {
        let mut session = sample_session();
        session.apply_all();
        let request = session.correction_request();

        assert_eq!(request.columns, vec!["Nome", "CPF"]);
        assert_eq!(request.corrections.len(), 2);
        assert_eq!(request.corrections[1].column_name, "CPF");
        assert_eq!(request.corrections[1].suggested_value, json!("123.456.789-09"));
        assert_eq!(request.data[0]["Nome"], json!("ANA"));
    }

    #[test]
    fn test_replace_rows_keeps_corrections() {
        let mut session = sample_session();
        session.apply_one(0).unwrap();
        session.replace_rows(vec![row(&[("Nome", "Ana"), ("CPF", "x")])]);
        assert_eq!(session.rows().len(), 1);
        assert_eq!(session.corrections().len(), 1);
        assert_eq!(session.issues().len(), 2);
    }

    #[test]
    fn test_load_analysis_derives_columns() {
        let response: AnalyzeResponse = serde_json::from_value(json!({
            "data": [{"B": "1", "A": "2"}],
            "issues": [{"row": 0, "column": 0, "column_name": "B", "issue_type": "number_format",
                        "value": "1", "suggested_value": "1,0"}]
        }))
        .unwrap();

        let mut session = CorrectionSession::new();
        session.load_analysis(response);
        assert_eq!(session.columns(), ["B".to_string(), "A".to_string()]);
        session.apply_one(0).unwrap();
        assert_eq!(session.to_csv(','), "B,A\n\"1,0\",2\n");
    }
}
