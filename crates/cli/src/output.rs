use anyhow::Result;
use birdnot_core::models::{FailureList, NormalizeSummary, RetrievalSummary, RunSummary, SearchResult};
use birdnot_core::preview::Preview;
use std::path::Path;

pub fn search(term: &str, results: &[SearchResult], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "term": term,
            "count": results.len(),
            "results": results,
        }))?);
    }
    let mut out = format!("{}: {} result(s)\n", term, results.len());
    for r in results {
        out.push_str(&r.image_url);
        out.push('\n');
    }
    Ok(out)
}

pub fn retrieval(category: &str, dest: &Path, summary: &RetrievalSummary, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "category": category,
            "directory": dest,
            "searched": summary.searched,
            "downloaded": summary.downloaded,
            "overwritten": summary.overwritten,
            "failed_downloads": summary.failed_downloads,
        }))?);
    }
    Ok(format!(
        "{}: searched {}, downloaded {}, failed {} -> {}\n",
        category,
        summary.searched,
        summary.downloaded,
        summary.failed_downloads,
        dest.display()
    ))
}

pub fn normalize(dir: &Path, summary: &NormalizeSummary, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "directory": dir,
            "examined": summary.examined,
            "resized": summary.resized,
            "unchanged": summary.unchanged,
            "skipped": summary.skipped,
        }))?);
    }
    Ok(format!(
        "{}: examined {}, resized {}, unchanged {}, skipped {}\n",
        dir.display(),
        summary.examined,
        summary.resized,
        summary.unchanged,
        summary.skipped.len()
    ))
}

pub fn failures(root: &Path, failed: &FailureList, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "root": root,
            "removed": failed,
        }))?);
    }
    let mut out = format!("{}: removed {} broken image(s)\n", root.display(), failed.len());
    for p in failed {
        out.push_str(&format!("  {}\n", p.display()));
    }
    Ok(out)
}

pub fn preview(p: &Preview, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(p)?);
    }
    Ok(format!(
        "saved {}\nthumbnail {} ({}x{})\n",
        p.image.display(),
        p.thumbnail.display(),
        p.width,
        p.height
    ))
}

pub fn run(summary: &RunSummary, json: bool) -> Result<String> {
    if json {
        let mut value = serde_json::to_value(summary)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("status".into(), "ok".into());
        }
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    let mut out = String::new();
    for report in &summary.categories {
        out.push_str(&format!(
            "{}: downloaded {}, failed {}, resized {}, skipped {}\n",
            report.category,
            report.retrieval.downloaded,
            report.retrieval.failed_downloads,
            report.normalize.resized,
            report.normalize.skipped.len()
        ));
    }
    out.push_str(&format!("removed {} broken image(s)\n", summary.failed.len()));
    for p in &summary.failed {
        out.push_str(&format!("  {}\n", p.display()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn search_lists_urls() {
        let results = vec![
            SearchResult::from_url("https://a/1.jpg"),
            SearchResult::from_url("https://a/2.jpg"),
        ];
        let text = search("bird photo", &results, false).unwrap();
        assert!(text.starts_with("bird photo: 2 result(s)"));
        assert!(text.contains("https://a/2.jpg"));

        let json: serde_json::Value =
            serde_json::from_str(&search("bird photo", &results, true).unwrap()).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["results"][0]["image_url"], "https://a/1.jpg");
    }

    #[test]
    fn failures_name_removed_paths() {
        let failed = vec![PathBuf::from("bird_or_not/bird/x.jpg")];
        let text = failures(Path::new("bird_or_not"), &failed, false).unwrap();
        assert!(text.contains("removed 1 broken image(s)"));
        assert!(text.contains("bird_or_not/bird/x.jpg"));
    }

    #[test]
    fn run_json_is_tagged_ok() {
        let json: serde_json::Value =
            serde_json::from_str(&run(&RunSummary::default(), true).unwrap()).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["failed"].as_array().unwrap().is_empty());
    }
}
