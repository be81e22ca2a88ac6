//! Result artifact store.
//!
//! One JSON artifact per job: `{job_id}.json` for a successful
//! evaluation, `{job_id}_error.json` for a failed one. The two
//! keyspaces never collide, so a job's outcome is unambiguous from the
//! filename alone.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use walkdir::WalkDir;

use crate::error::StorageError;

/// Suffix distinguishing failure artifacts from success artifacts.
const ERROR_SUFFIX: &str = "_error";

/// Longest summary shown in a preview before trimming.
const SUMMARY_PREVIEW_CHARS: usize = 300;

static RE_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(\.\d+)?)\s*(?:-|\sto\s)?\s*years?").unwrap());

/// Stores evaluation artifacts on the filesystem.
#[derive(Debug, Clone)]
pub struct ResultStore {
    results_directory: PathBuf,
}

impl ResultStore {
    pub fn new<P: AsRef<Path>>(results_directory: P) -> Self {
        Self {
            results_directory: results_directory.as_ref().to_path_buf(),
        }
    }

    pub fn results_directory(&self) -> &Path {
        &self.results_directory
    }

    /// Path of the success artifact for a job.
    pub fn success_path(&self, job_id: &str) -> PathBuf {
        self.results_directory.join(format!("{}.json", job_id))
    }

    /// Path of the failure artifact for a job.
    pub fn failure_path(&self, job_id: &str) -> PathBuf {
        self.results_directory
            .join(format!("{}{}.json", job_id, ERROR_SUFFIX))
    }

    /// Writes a success artifact, replacing any previous one.
    ///
    /// The payload lands under a temporary name and is renamed into
    /// place, so a reader never observes a half-written artifact under
    /// the real key.
    pub fn write_success(&self, job_id: &str, payload: &Value) -> Result<PathBuf, StorageError> {
        let path = self.success_path(job_id);
        self.write_atomic(&path, payload)?;
        Ok(path)
    }

    /// Writes a failure artifact carrying the error message and trace.
    pub fn write_failure(
        &self,
        job_id: &str,
        error: &str,
        trace: &str,
    ) -> Result<PathBuf, StorageError> {
        let path = self.failure_path(job_id);
        self.write_atomic(&path, &json!({ "error": error, "trace": trace }))?;
        Ok(path)
    }

    /// Reads whatever artifact exists for a job.
    ///
    /// Success artifact first, failure artifact second, `None` when the
    /// job left nothing behind. Unparseable content comes back wrapped
    /// as `{"_raw": ...}` (success key) or `{"_raw_error": ...}`
    /// (failure key) so callers always get something displayable.
    pub fn read(&self, job_id: &str) -> Option<Value> {
        read_artifact(&self.success_path(job_id), "_raw")
            .or_else(|| read_artifact(&self.failure_path(job_id), "_raw_error"))
    }

    /// Scans the results directory for artifacts, newest first.
    ///
    /// Browsing fallback for when no database is available. Unreadable
    /// entries are skipped.
    pub fn list(&self) -> Vec<ResultEntry> {
        let mut entries: Vec<ResultEntry> = WalkDir::new(&self.results_directory)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter_map(|e| ResultEntry::from_path(e.path()))
            .collect();
        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        entries
    }

    fn write_atomic(&self, path: &Path, payload: &Value) -> Result<(), StorageError> {
        self.ensure_directory()?;

        let bytes = serde_json::to_vec_pretty(payload).map_err(|e| StorageError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, &bytes).map_err(|e| StorageError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, path).map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        if !self.results_directory.exists() {
            std::fs::create_dir_all(&self.results_directory).map_err(|e| {
                StorageError::CreateDirectory {
                    path: self.results_directory.clone(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }
}

fn read_artifact(path: &Path, raw_key: &str) -> Option<Value> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("Failed to read artifact {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(json!({ raw_key: String::from_utf8_lossy(&bytes) })),
    }
}

/// A single artifact discovered by a directory scan.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub job_id: String,
    pub failed: bool,
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl ResultEntry {
    fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_name()?.to_str()?.strip_suffix(".json")?;
        let (job_id, failed) = match stem.strip_suffix(ERROR_SUFFIX) {
            Some(id) => (id, true),
            None => (stem, false),
        };
        let modified = path.metadata().ok()?.modified().ok()?;
        Some(Self {
            job_id: job_id.to_string(),
            failed,
            path: path.to_path_buf(),
            modified,
        })
    }
}

/// Candidate keys checked in priority order when previewing an artifact.
const NAME_KEYS: &[&str] = &["name", "candidate_name", "full_name", "person_name"];
const SCORE_KEYS: &[&str] = &[
    "match_percentage",
    "match_pct",
    "match",
    "score",
    "overall_score",
    "percent",
];
const SUMMARY_KEYS: &[&str] = &[
    "summary",
    "final_summary",
    "feedback",
    "explanation",
    "conclusion",
];
const EXPERIENCE_KEYS: &[&str] = &["years_experience", "experience"];

/// Display-oriented summary of an evaluation artifact.
///
/// Artifacts come from an external model and their shape drifts, so
/// every field is recovered best-effort from a prioritized candidate
/// key list; a field that cannot be recovered stays `None`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPreview {
    pub candidate: Option<String>,
    pub match_score: Option<String>,
    pub summary: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
}

impl ResultPreview {
    /// Extracts a preview from an arbitrary artifact value.
    pub fn from_value(data: &Value) -> Self {
        let Some(map) = data.as_object() else {
            return Self::default();
        };

        let candidate = first_present(map, NAME_KEYS).map(stringify);
        let match_score = first_present(map, SCORE_KEYS).map(format_score);
        let full_summary = first_present(map, SUMMARY_KEYS).map(stringify);
        let skills = extract_skills(map);
        let experience = extract_experience(map, full_summary.as_deref());
        let summary = full_summary.map(|s| trim_summary(&s));

        Self {
            candidate,
            match_score,
            summary,
            skills,
            experience,
        }
    }
}

fn get_ci<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| get_ci(map, k))
        .find(|v| !is_empty(v))
}

fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a score value: fractions in `0..=1` become percentages,
/// whole numbers lose their decimal point, anything non-numeric is
/// passed through as text.
fn format_score(v: &Value) -> String {
    let parsed = v
        .as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()));
    match parsed {
        Some(fv) if fv <= 1.0 => format!("{:.1}%", fv * 100.0),
        Some(fv) if fv.fract() != 0.0 => format!("{:.1}", fv),
        Some(fv) => format!("{}", fv as i64),
        None => stringify(v),
    }
}

fn extract_skills(map: &Map<String, Value>) -> Option<String> {
    if let Some(v) = get_ci(map, "skills").filter(|v| !is_empty(v)) {
        return Some(join_skills(v));
    }
    // Any short-named list of strings can stand in for a skills field.
    map.iter()
        .filter(|(k, _)| k.len() < 20)
        .filter_map(|(_, v)| v.as_array())
        .find(|a| !a.is_empty() && a.iter().take(5).all(|i| i.is_string()))
        .map(|a| {
            a.iter()
                .take(10)
                .map(stringify)
                .collect::<Vec<_>>()
                .join(", ")
        })
}

fn join_skills(v: &Value) -> String {
    match v {
        Value::Array(items) => items
            .iter()
            .take(10)
            .map(stringify)
            .collect::<Vec<_>>()
            .join(", "),
        other => stringify(other),
    }
}

fn extract_experience(map: &Map<String, Value>, summary: Option<&str>) -> Option<String> {
    if let Some(v) = first_present(map, EXPERIENCE_KEYS) {
        return Some(stringify(v));
    }

    // Fall back to scanning textual fields for a "N years" mention.
    let mut sources: Vec<&str> = Vec::new();
    if let Some(s) = summary {
        sources.push(s);
    }
    sources.extend(
        map.values()
            .filter_map(|v| v.as_str())
            .filter(|s| s.len() < 500),
    );

    sources
        .iter()
        .find_map(|text| RE_YEARS.captures(text))
        .map(|c| format!("{} years", &c[1]))
}

fn trim_summary(summary: &str) -> String {
    if summary.chars().count() <= SUMMARY_PREVIEW_CHARS {
        return summary.to_string();
    }
    let head: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    format!("{}…", head.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ResultStore) {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("results"));
        (dir, store)
    }

    #[test]
    fn test_write_and_read_success() {
        let (_dir, store) = store();
        let payload = json!({ "candidate_name": "Ada", "match_percentage": 92 });

        let path = store.write_success("job-1", &payload).unwrap();
        assert!(path.ends_with("job-1.json"));
        assert!(path.exists());

        let read = store.read("job-1").unwrap();
        assert_eq!(read, payload);
    }

    #[test]
    fn test_write_failure_shape() {
        let (_dir, store) = store();

        let path = store
            .write_failure("job-2", "PDF parse failed", "ExtractError: bad xref")
            .unwrap();
        assert!(path.ends_with("job-2_error.json"));

        let read = store.read("job-2").unwrap();
        assert_eq!(read["error"], "PDF parse failed");
        assert_eq!(read["trace"], "ExtractError: bad xref");
    }

    #[test]
    fn test_read_prefers_success_artifact() {
        let (_dir, store) = store();
        store.write_failure("job-3", "first attempt", "trace").unwrap();
        store
            .write_success("job-3", &json!({ "ok": true }))
            .unwrap();

        let read = store.read("job-3").unwrap();
        assert_eq!(read["ok"], true);
    }

    #[test]
    fn test_read_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.read("nothing-here").is_none());
    }

    #[test]
    fn test_unparseable_success_wraps_raw() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.results_directory()).unwrap();
        std::fs::write(store.success_path("job-4"), b"not json at all").unwrap();

        let read = store.read("job-4").unwrap();
        assert_eq!(read["_raw"], "not json at all");
    }

    #[test]
    fn test_unparseable_failure_wraps_raw_error() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.results_directory()).unwrap();
        std::fs::write(store.failure_path("job-5"), b"<<garbage>>").unwrap();

        let read = store.read("job-5").unwrap();
        assert_eq!(read["_raw_error"], "<<garbage>>");
    }

    #[test]
    fn test_rewrite_same_key_replaces() {
        let (_dir, store) = store();
        store.write_success("job-6", &json!({ "v": 1 })).unwrap();
        store.write_success("job-6", &json!({ "v": 2 })).unwrap();

        let read = store.read("job-6").unwrap();
        assert_eq!(read["v"], 2);
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let (_dir, store) = store();
        store.write_success("job-7", &json!({ "v": 1 })).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(store.results_directory())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_success_and_failure_keys_disjoint() {
        let (_dir, store) = store();
        assert_ne!(store.success_path("job-8"), store.failure_path("job-8"));
    }

    #[test]
    fn test_list_finds_both_kinds() {
        let (_dir, store) = store();
        store.write_success("ok-job", &json!({ "v": 1 })).unwrap();
        store.write_failure("bad-job", "boom", "trace").unwrap();

        let entries = store.list();
        assert_eq!(entries.len(), 2);

        let ok = entries.iter().find(|e| e.job_id == "ok-job").unwrap();
        assert!(!ok.failed);
        let bad = entries.iter().find(|e| e.job_id == "bad-job").unwrap();
        assert!(bad.failed);
    }

    #[test]
    fn test_list_skips_non_artifacts() {
        let (_dir, store) = store();
        store.write_success("job-9", &json!({ "v": 1 })).unwrap();
        std::fs::write(store.results_directory().join("stray.json.tmp"), b"x").unwrap();
        std::fs::write(store.results_directory().join("notes.txt"), b"x").unwrap();

        let entries = store.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].job_id, "job-9");
    }

    #[test]
    fn test_preview_from_typical_artifact() {
        let value = json!({
            "candidate_name": "Grace Hopper",
            "years_experience": 10,
            "match_percentage": 87.5,
            "feedback": "Strong systems background."
        });

        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.candidate.as_deref(), Some("Grace Hopper"));
        assert_eq!(preview.match_score.as_deref(), Some("87.5"));
        assert_eq!(
            preview.summary.as_deref(),
            Some("Strong systems background.")
        );
    }

    #[test]
    fn test_preview_keys_are_case_insensitive() {
        let value = json!({ "Candidate_Name": "Ada", "Match_Percentage": 90 });
        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.candidate.as_deref(), Some("Ada"));
        assert_eq!(preview.match_score.as_deref(), Some("90"));
    }

    #[test]
    fn test_preview_fractional_score_becomes_percentage() {
        let value = json!({ "score": 0.85 });
        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.match_score.as_deref(), Some("85.0%"));
    }

    #[test]
    fn test_preview_non_numeric_score_passes_through() {
        let value = json!({ "match": "excellent" });
        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.match_score.as_deref(), Some("excellent"));
    }

    #[test]
    fn test_preview_experience_from_text() {
        let value = json!({
            "feedback": "The candidate brings 7 years of backend work."
        });
        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.experience.as_deref(), Some("7 years"));
    }

    #[test]
    fn test_preview_explicit_experience_wins() {
        let value = json!({
            "experience": "12+",
            "feedback": "Around 3 years of frontend."
        });
        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.experience.as_deref(), Some("12+"));
    }

    #[test]
    fn test_preview_years_experience_key() {
        let value = json!({
            "candidate_name": "Jane Doe",
            "years_experience": 7,
            "match_percentage": 85,
            "feedback": "Strong systems background."
        });
        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.experience.as_deref(), Some("7"));
        assert_eq!(preview.candidate.as_deref(), Some("Jane Doe"));
        assert_eq!(preview.match_score.as_deref(), Some("85"));
    }

    #[test]
    fn test_preview_skills_join() {
        let value = json!({ "skills": ["Rust", "SQL", "Kubernetes"] });
        let preview = ResultPreview::from_value(&value);
        assert_eq!(preview.skills.as_deref(), Some("Rust, SQL, Kubernetes"));
    }

    #[test]
    fn test_preview_long_summary_is_trimmed() {
        let long = "x".repeat(400);
        let value = json!({ "summary": long });
        let preview = ResultPreview::from_value(&value);
        let summary = preview.summary.unwrap();
        assert!(summary.chars().count() <= SUMMARY_PREVIEW_CHARS + 1);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn test_preview_non_object_is_empty() {
        let preview = ResultPreview::from_value(&json!("just a string"));
        assert!(preview.candidate.is_none());
        assert!(preview.match_score.is_none());
        assert!(preview.summary.is_none());
    }
}
