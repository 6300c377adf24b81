//! Run report model.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tagbook_io_xlsx::SpecXlsxReport;

/// Aggregate result of one `build` or `normalize` run.
#[derive(Debug, Default, Clone)]
pub struct SpecBuildReport {
    /// Catalog entries processed.
    pub cnt_tables: u64,
    /// Files written (workbooks, normalized configs, catalog export).
    pub files_out: Vec<PathBuf>,
    /// Per-document writer reports, catalog document order.
    pub documents: Vec<SpecXlsxReport>,
    /// Non-fatal warnings (defaulting, sheet renames, scalar tables).
    pub warnings: Vec<String>,
}

impl SpecBuildReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let n_sheets: usize = self.documents.iter().map(|d| d.sheets.len()).sum();

        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_documents".to_string(), self.documents.len() as u64);
        dict_counts.insert("cnt_sheets".to_string(), n_sheets as u64);
        dict_counts.insert("cnt_tables".to_string(), self.cnt_tables);
        dict_counts.insert("cnt_files".to_string(), self.files_out.len() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} documents={} sheets={} tables={} files={} warnings={}",
            dict_counts["cnt_documents"],
            dict_counts["cnt_sheets"],
            dict_counts["cnt_tables"],
            dict_counts["cnt_files"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for SpecBuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[BUILD]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_counts_documents_and_sheets() {
        let mut report = SpecBuildReport {
            cnt_tables: 4,
            files_out: vec![PathBuf::from("out/A.xlsx"), PathBuf::from("out/B.xlsx")],
            documents: vec![
                SpecXlsxReport {
                    sheets: vec!["S1".to_string(), "S2".to_string()],
                    ..SpecXlsxReport::default()
                },
                SpecXlsxReport {
                    sheets: vec!["S1".to_string()],
                    ..SpecXlsxReport::default()
                },
            ],
            warnings: vec![],
        };
        report.warn("w");

        let txt = report.format("[BUILD]");
        assert_eq!(
            txt,
            "[BUILD] documents=2 sheets=3 tables=4 files=2 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }
}
