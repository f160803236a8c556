use serde::Deserialize;

/// The archive wraps every tabular response in a
/// `{"ResultSet": {"Result": [...]}}` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultSet<T> {
    #[serde(rename = "ResultSet")]
    pub result_set: ResultRows<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultRows<T> {
    #[serde(rename = "Result")]
    pub result: Vec<T>,
}

/// Experiment metadata row: the project and subject id behind a session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub project: String,
    #[serde(rename = "subject_ID")]
    pub subject_id: String,
}

/// Subject metadata row carrying the human-readable label.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubjectRecord {
    pub label: String,
}

/// One scan row from the per-session scan list.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub series_description: String,
    #[serde(rename = "type", default)]
    pub scan_type: String,
}

/// One resource row from the per-scan resource list. `file_count` arrives
/// as a string and may be blank.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRecord {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub file_count: String,
    #[serde(default)]
    pub xnat_abstractresource_id: String,
}

/// One file row from a representation's file listing. `uri` is present in
/// URI-locator mode, `absolute_path` in absolutePath-locator mode.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "URI", default)]
    pub uri: String,
    #[serde(rename = "absolutePath", default)]
    pub absolute_path: Option<String>,
}

/// One naming-rule row from a project- or site-scope bidsmap document.
/// Rows missing either field are dropped by the naming map builder.
#[derive(Debug, Clone, Deserialize)]
pub struct NamingRuleRecord {
    pub series_description: Option<String>,
    pub bidsname: Option<String>,
}
