//! JSON export of resolved ads

use crate::ads::ResolvedAd;
use crate::output::OutputResult;
use std::fs;
use std::path::Path;

/// Writes every resolved ad to `output_path` as a pretty-printed JSON array
///
/// Missing parent directories are created. An empty slice still produces
/// a valid (empty) array so downstream tooling can rely on the file.
///
/// # Arguments
///
/// * `output_path` - Destination file, overwritten if it exists
/// * `ads` - The ads to export, in order
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the export
/// * `Err(OutputError)` - Failed to serialize or write
pub fn export_json(output_path: &Path, ads: &[ResolvedAd]) -> OutputResult<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut json = serde_json::to_string_pretty(ads)?;
    json.push('\n');
    fs::write(output_path, json)?;

    tracing::info!("Exported {} ads to {}", ads.len(), output_path.display());
    Ok(())
}

/// Reads a file previously written by [`export_json`]
pub fn read_export(path: &Path) -> OutputResult<Vec<ResolvedAd>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::AdObservation;
    use crate::resolver::Resolution;
    use tempfile::TempDir;

    fn create_test_ad(final_url: &str) -> ResolvedAd {
        let mut ad = ResolvedAd::from_resolution(
            AdObservation::new("bing", "ipad & co", "https://www.bing.com/aclick?u=x"),
            Resolution {
                final_url: final_url.to_string(),
                final_domain: "shop.example.com".to_string(),
                hops: Vec::new(),
            },
        );
        ad.redirect_chain = vec![
            "https://www.bing.com/aclick?u=x".to_string(),
            final_url.to_string(),
        ];
        ad
    }

    #[test]
    fn test_export_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ads.json");

        export_json(&path, &[create_test_ad("https://shop.example.com/")]).unwrap();

        assert!(path.exists());
        let ads = read_export(&path).unwrap();
        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].redirect_chain.len(), 2);
    }

    #[test]
    fn test_export_keeps_html_characters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.json");

        export_json(&path, &[create_test_ad("https://shop.example.com/?a=1&b=<2>")]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("a=1&b=<2>"));
        assert!(raw.contains("\"query\": \"ipad & co\""));
        assert!(raw.ends_with("]\n"));
    }

    #[test]
    fn test_export_empty_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.json");

        export_json(&path, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
        assert!(read_export(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_export_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ads.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(read_export(&path), Err(crate::output::OutputError::Json(_))));
    }
}
