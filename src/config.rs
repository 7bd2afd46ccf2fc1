// Pipeline configuration: which interactions count toward the engagement
// rate, and which source column names map onto each canonical field.
use crate::error::ReportError;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Canonical fields of a normalized row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Timestamp,
    Likes,
    Comments,
    Shares,
    Bookmarks,
    Impressions,
    Engagements,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Timestamp,
        Field::Likes,
        Field::Comments,
        Field::Shares,
        Field::Bookmarks,
        Field::Impressions,
        Field::Engagements,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Likes => "likes",
            Field::Comments => "comments",
            Field::Shares => "shares",
            Field::Bookmarks => "bookmarks",
            Field::Impressions => "impressions",
            Field::Engagements => "engagements",
        }
    }

    pub fn from_canonical(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.canonical_name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Ordered list of accepted source column names per canonical field.
///
/// The first name in a list that appears in the input header wins. The
/// canonical name is always accepted, so a table written back out with
/// canonical headers resolves to the same fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    names: BTreeMap<Field, Vec<String>>,
}

static DEFAULT_ALIASES: Lazy<ColumnAliases> = Lazy::new(|| {
    let table: [(Field, &[&str]); 7] = [
        (
            Field::Timestamp,
            &["timestamp", "Timestamp", "date", "Date", "created_at", "Time", "time"],
        ),
        (Field::Likes, &["likes", "Likes"]),
        (Field::Comments, &["comments", "Comments", "replies", "Replies"]),
        (
            Field::Shares,
            &["shares", "Shares", "reposts", "Reposts", "retweets", "Retweets"],
        ),
        (Field::Bookmarks, &["bookmarks", "Bookmarks"]),
        (Field::Impressions, &["impressions", "Impressions"]),
        (Field::Engagements, &["engagements", "Engagements"]),
    ];
    let names = table
        .iter()
        .map(|(field, list)| (*field, list.iter().map(|s| s.to_string()).collect()))
        .collect();
    ColumnAliases { names }
});

impl Default for ColumnAliases {
    fn default() -> Self {
        DEFAULT_ALIASES.clone()
    }
}

impl ColumnAliases {
    pub fn names(&self, field: Field) -> &[String] {
        self.names.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the accepted names for one field. The canonical name is
    /// appended if the caller left it out.
    pub fn set(&mut self, field: Field, mut names: Vec<String>) {
        if !names.iter().any(|n| n == field.canonical_name()) {
            names.push(field.canonical_name().to_string());
        }
        self.names.insert(field, names);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineConfig {
    /// Count bookmarks toward the interaction total.
    pub include_bookmarks_in_interactions: bool,
    pub column_aliases: ColumnAliases,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    include_bookmarks_in_interactions: Option<bool>,
    column_aliases: BTreeMap<String, Vec<String>>,
}

/// Parse a TOML config document on top of the defaults.
///
/// Alias lists given in the file replace the default list for that field
/// only; fields the file does not mention keep their defaults.
pub fn parse_config(text: &str, origin: &Path) -> Result<PipelineConfig, ReportError> {
    let file: ConfigFile = toml::from_str(text).map_err(|source| ReportError::Config {
        path: origin.to_path_buf(),
        source,
    })?;
    let mut config = PipelineConfig::default();
    if let Some(flag) = file.include_bookmarks_in_interactions {
        config.include_bookmarks_in_interactions = flag;
    }
    for (key, names) in file.column_aliases {
        let field = Field::from_canonical(&key).ok_or_else(|| ReportError::UnknownField {
            path: origin.to_path_buf(),
            field: key.clone(),
        })?;
        config.column_aliases.set(field, names);
    }
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, ReportError> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text, path)
}

/// Config for a run: the file if given, else defaults. A set
/// `include_bookmarks` flag wins over the file; an unset one leaves the
/// file's choice alone.
pub fn resolve_config(
    file: Option<&Path>,
    include_bookmarks: bool,
) -> Result<PipelineConfig, ReportError> {
    let mut config = match file {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    if include_bookmarks {
        config.include_bookmarks_in_interactions = true;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_known_export_variants() {
        let aliases = ColumnAliases::default();
        assert_eq!(aliases.names(Field::Likes), ["likes", "Likes"]);
        assert!(aliases.names(Field::Comments).iter().any(|n| n == "Replies"));
        assert!(aliases.names(Field::Shares).iter().any(|n| n == "Reposts"));
        for field in Field::ALL {
            assert_eq!(aliases.names(field)[0], field.canonical_name());
        }
    }

    #[test]
    fn file_overrides_only_named_fields() {
        let text = r#"
include_bookmarks_in_interactions = true

[column_aliases]
likes = ["Favorites", "favs"]
"#;
        let config = parse_config(text, Path::new("test.toml")).unwrap();
        assert!(config.include_bookmarks_in_interactions);
        assert_eq!(
            config.column_aliases.names(Field::Likes),
            ["Favorites", "favs", "likes"]
        );
        assert_eq!(
            config.column_aliases.names(Field::Impressions),
            ColumnAliases::default().names(Field::Impressions)
        );
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse_config("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    fn write_config(name: &str, text: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "engagement-report-{}-{}.toml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn bookmarks_flag_overrides_file() {
        let path = write_config("flag-off", "include_bookmarks_in_interactions = false\n");
        let config = resolve_config(Some(&path), true).unwrap();
        assert!(config.include_bookmarks_in_interactions);
        let config = resolve_config(Some(&path), false).unwrap();
        assert!(!config.include_bookmarks_in_interactions);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unset_flag_keeps_file_choice() {
        let path = write_config("flag-on", "include_bookmarks_in_interactions = true\n");
        let config = resolve_config(Some(&path), false).unwrap();
        assert!(config.include_bookmarks_in_interactions);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn no_file_means_defaults_plus_flag() {
        assert_eq!(resolve_config(None, false).unwrap(), PipelineConfig::default());
        assert!(resolve_config(None, true).unwrap().include_bookmarks_in_interactions);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let text = "[column_aliases]\nviews = [\"Views\"]\n";
        let err = parse_config(text, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ReportError::UnknownField { ref field, .. } if field == "views"));
    }
}
