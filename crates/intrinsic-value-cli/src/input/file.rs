use std::fs;
use std::path::{Path, PathBuf};

use intrinsic_value_core::provider::normalize_ticker;

/// Read a ticker list: one ticker per line, blank lines and `#` comments skipped.
pub fn read_ticker_file(path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let tickers = parse_tickers(&contents);
    if tickers.is_empty() {
        return Err(format!("No tickers found in '{}'", canonical.display()).into());
    }
    Ok(tickers)
}

pub fn parse_tickers(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .map(normalize_ticker)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Resolve a path against the working directory and check it names a file.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_tickers_skips_comments_and_blanks() {
        let contents = "# watchlist\naapl\n\n  msft  \nbrk.b # class B\n#ignored\n";
        assert_eq!(parse_tickers(contents), vec!["AAPL", "MSFT", "BRK.B"]);
    }

    #[test]
    fn test_read_ticker_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        fs::write(&path, "acme\nfoo\n").unwrap();
        let tickers = read_ticker_file(path.to_str().unwrap()).unwrap();
        assert_eq!(tickers, vec!["ACME", "FOO"]);
    }

    #[test]
    fn test_read_ticker_file_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        fs::write(&path, "# nothing here\n\n").unwrap();
        let err = read_ticker_file(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("No tickers"));
    }

    #[test]
    fn test_resolve_path_rejects_directories_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        assert!(resolve_path(dir_str).unwrap_err().to_string().starts_with("Not a file"));

        let missing = dir.path().join("missing.txt");
        let err = resolve_path(missing.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}
