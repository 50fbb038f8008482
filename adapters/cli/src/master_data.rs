//! Loading of gacha master data from TOML or JSON documents.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use gacha_route_core::{ConfigurationFile, ConfigurationSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DataFormat {
    Toml,
    Json,
}

impl DataFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Reads and validates the master data file at `path`.
pub(crate) fn load(path: &Path) -> Result<ConfigurationSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read master data {}", path.display()))?;
    parse(&text, DataFormat::from_path(path))
        .with_context(|| format!("invalid master data in {}", path.display()))
}

fn parse(text: &str, format: DataFormat) -> Result<ConfigurationSet> {
    let file: ConfigurationFile = match format {
        DataFormat::Toml => toml::from_str(text).context("malformed TOML")?,
        DataFormat::Json => serde_json::from_str(text).context("malformed JSON")?,
    };
    Ok(ConfigurationSet::from_file(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_route_core::{GachaId, ItemId, Rarity};

    const TOML_DATA: &str = r#"
[[gacha]]
id = 1
name = "normal"
bundle_sizes = [11]
thresholds = { common = 0, rare = 7000, super = 9500, uber = 10000 }

[[gacha.pools.rare]]
id = 10
name = "A"

[[gacha.pools.rare]]
id = 11
name = "B"

[[gacha.pools.uber]]
id = 90
name = "U"
limited = true
"#;

    #[test]
    fn toml_master_data_is_validated() {
        let set = parse(TOML_DATA, DataFormat::Toml).expect("valid TOML");
        let configuration = set.get(GachaId::new(1)).expect("gacha 1");

        assert!(configuration.supports_bundle(11));
        assert_eq!(configuration.pool(Rarity::Rare).len(), 2);
        let (rarity, entry) = configuration.entry(ItemId::new(90)).expect("uber entry");
        assert_eq!(rarity, Rarity::Uber);
        assert!(entry.is_limited());
    }

    #[test]
    fn json_master_data_rejects_bad_thresholds() {
        let json = r#"{"gacha":[{"id":2,"thresholds":{"rare":9000,"super":8000,"uber":10000}}]}"#;
        assert!(parse(json, DataFormat::Json).is_err());
    }

    #[test]
    fn extension_selects_format() {
        assert_eq!(DataFormat::from_path(Path::new("data.JSON")), DataFormat::Json);
        assert_eq!(DataFormat::from_path(Path::new("data.toml")), DataFormat::Toml);
        assert_eq!(DataFormat::from_path(Path::new("data")), DataFormat::Toml);
    }
}
