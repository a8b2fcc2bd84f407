// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

fn default_table() -> String {
    "heart_rate".into()
}

fn default_page_size() -> usize {
    100
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileStoreConfig {
    /// Directory holding one `{table}.jsonl` file per table.
    pub data_dir: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}
