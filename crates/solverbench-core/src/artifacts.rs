//! On-disk artifact naming.
//!
//! Every (instance, configuration) pair owns exactly one stdout log and one
//! stderr log, so concurrent runs never share a file:
//!
//! ```text
//! <output_dir>/<instance>+<label>.log
//! <output_dir>/error/<instance>+<label>.err.log
//! ```

use std::path::{Path, PathBuf};

/// Separator between instance and configuration label in artifact names.
pub const PAIR_SEPARATOR: char = '+';

/// Sub-directory of the output directory holding stderr logs.
pub const ERROR_DIR: &str = "error";

pub fn log_path_for(output_dir: &Path, instance: &str, label: &str) -> PathBuf {
    output_dir.join(format!("{instance}{PAIR_SEPARATOR}{label}.log"))
}

pub fn error_log_path_for(output_dir: &Path, instance: &str, label: &str) -> PathBuf {
    output_dir
        .join(ERROR_DIR)
        .join(format!("{instance}{PAIR_SEPARATOR}{label}.err.log"))
}

/// Instance name used in artifact paths: the file stem of the instance file.
pub fn instance_name(instance_path: &Path) -> String {
    instance_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| instance_path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths() {
        let out = Path::new("/tmp/results");
        assert_eq!(
            log_path_for(out, "golomb_10", "dom-wdeg"),
            PathBuf::from("/tmp/results/golomb_10+dom-wdeg.log")
        );
        assert_eq!(
            error_log_path_for(out, "golomb_10", "dom-wdeg"),
            PathBuf::from("/tmp/results/error/golomb_10+dom-wdeg.err.log")
        );
    }

    #[test]
    fn test_instance_name_is_file_stem() {
        assert_eq!(instance_name(Path::new("corpus/rcpsp/j30_1.fzn")), "j30_1");
        assert_eq!(instance_name(Path::new("plain")), "plain");
    }
}
