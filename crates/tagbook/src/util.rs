//! Small helpers shared by the build orchestration.

use std::path::{Path, PathBuf};

/// Resolve effective worker count.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

/// Output workbook path of one document.
pub fn derive_workbook_path(path_dir_output: &Path, document_name: &str) -> PathBuf {
    path_dir_output.join(format!("{document_name}.xlsx"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_limit_is_at_least_one() {
        assert_eq!(calculate_worker_limit(Some(0)), 1);
        assert_eq!(calculate_worker_limit(Some(1)), 1);
        assert!(calculate_worker_limit(None) >= 1);
        assert!(calculate_worker_limit(None) <= 8);
    }

    #[test]
    fn test_workbook_path() {
        assert_eq!(
            derive_workbook_path(Path::new("out"), "BaseYear"),
            PathBuf::from("out").join("BaseYear.xlsx")
        );
    }
}
