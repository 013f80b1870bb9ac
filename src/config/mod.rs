use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::form::sample::TransactionItem;
use crate::form::NumberField;
use crate::utils;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/";

/// Overrides for one numeric form field, keyed by field id in the config.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct FieldConfig {
    pub label: Option<String>,
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "server")]
    pub server_url: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub no_color: Option<bool>,
    pub verbose: Option<u8>,
    pub is_new_repos: Option<bool>,
    pub export_path: Option<String>,
    pub fields: Option<BTreeMap<String, FieldConfig>>,
    pub items: Option<Vec<TransactionItem>>,
    pub samples: Option<Vec<String>>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".patternscope").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

/// Applies `fields` overrides to a form's field list. Ids that match no
/// field are reported and skipped.
pub fn apply_field_overrides(
    mut fields: Vec<NumberField>,
    overrides: Option<&BTreeMap<String, FieldConfig>>,
) -> Vec<NumberField> {
    let Some(overrides) = overrides else {
        return fields;
    };
    for field in fields.iter_mut() {
        let Some(o) = overrides.get(&field.id) else {
            continue;
        };
        if let Some(label) = o.label.as_ref() {
            field.label = label.clone();
        }
        if let Some(min) = o.min {
            field.min = min;
        }
        if let Some(max) = o.max {
            field.max = max;
        }
        if let Some(value) = o.value {
            field.value = utils::format_number(value);
        }
    }
    fields
}

/// Field ids in `fields` that no form knows about.
pub fn unknown_field_ids(cfg: &ConfigFile, known: &[&str]) -> Vec<String> {
    cfg.fields
        .as_ref()
        .map(|m| {
            m.keys()
                .filter(|k| !known.contains(&k.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn default_config_yaml() -> String {
    r#"# patternscope config
#
# Location (default):
#   ~/.patternscope/config.yml

# Backend
server_url: http://127.0.0.1:8000/
# Request timeout in seconds (unset = transport default)
# timeout: 30
# proxy: http://127.0.0.1:8080

# Output styling
no_color: false
# verbose: 1

# Sample creation
is_new_repos: false

# Numeric field overrides, keyed by field id.
# Ids: minParticipants, minStars, numRepos,
#      antecedent, antecedent_max, consequent, consequent_max,
#      minsup, minconf, lift
# fields:
#   numRepos:
#     value: 500
#     max: 5000
#   minsup:
#     value: 0.05

# Transaction item catalog (division: dec, qua or omitted for categorical)
# items:
#   - label: pushes
#     division: qua
#   - label: forks
#     division: dec
#   - label: language

# Saved sample ids offered on the pattern search page
# samples: ["1", "2"]

# Default export target
export_path: data.xlsx
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::sample::{default_sample_fields, DivisionType};
    use crate::form::{NUM_REPOS, MIN_STARS};

    #[test]
    fn default_yaml_parses() {
        let cfg: ConfigFile = serde_yaml::from_str(&default_config_yaml()).unwrap();
        assert_eq!(cfg.server_url.as_deref(), Some(DEFAULT_SERVER_URL));
        assert_eq!(cfg.no_color, Some(false));
        assert!(cfg.fields.is_none());
    }

    #[test]
    fn missing_file_is_tolerated_only_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false).unwrap_err().contains("not found"));
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        assert!(!ensure_default_config_file(&path).unwrap());
        assert!(load_config(&path, false).is_ok());
    }

    #[test]
    fn field_overrides_replace_bounds_and_values() {
        let cfg: ConfigFile = serde_yaml::from_str(
            "fields:\n  numRepos:\n    value: 50\n    max: 5000\n  bogus:\n    value: 1\n",
        )
        .unwrap();
        let fields = apply_field_overrides(default_sample_fields(), cfg.fields.as_ref());
        let repos = fields.iter().find(|f| f.id == NUM_REPOS).unwrap();
        assert_eq!(repos.value, "50");
        assert_eq!(repos.max, 5000.0);
        let stars = fields.iter().find(|f| f.id == MIN_STARS).unwrap();
        assert_eq!(stars.value, "10");
        assert_eq!(unknown_field_ids(&cfg, &[NUM_REPOS]), vec!["bogus"]);
    }

    #[test]
    fn item_catalog_reads_division_tags() {
        let cfg: ConfigFile = serde_yaml::from_str(
            "items:\n  - label: pushes\n    division: dec\n  - label: language\n",
        )
        .unwrap();
        let items = cfg.items.unwrap();
        assert_eq!(items[0].division, Some(DivisionType::Deciles));
        assert_eq!(items[1].division, None);
        assert!(!items[1].checked);
    }

    #[test]
    fn tilde_expands_under_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/x.yml"), home.join("x.yml"));
        }
        assert_eq!(expand_tilde("/abs/x.yml"), PathBuf::from("/abs/x.yml"));
    }
}
