use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::error::InitError;

/// 内置的 `物体 ID -> 行星 ID` 映射
const DEFAULT_PLANETS: &[(&str, &str)] = &[
    ("stamp_1", "earth"),
    ("stamp_2", "mars"),
    ("stamp_3", "jupiter"),
    ("stamp_4", "saturn"),
    ("stamp_5", "neptune"),
];

/// 物体 ID 到行星 ID 的静态映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanetMap(HashMap<String, String>);

impl Default for PlanetMap {
    fn default() -> Self {
        DEFAULT_PLANETS.iter().copied().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlanetMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl PlanetMap {
    /// 从 JSON 文件加载映射，文件内容为 `{"object_id": "planet_id"}`
    pub fn from_file(path: &Path) -> Result<Self, InitError> {
        let load = || -> anyhow::Result<Self> {
            let content = std::fs::read_to_string(path).context("failed to read file")?;
            let map: HashMap<String, String> =
                serde_json::from_str(&content).context("expected a JSON object of strings")?;
            Ok(Self(map))
        };
        load().map_err(|err| InitError::PlanetMap { path: path.to_path_buf(), err })
    }

    /// 查找物体对应的行星，没有映射时返回 None
    pub fn resolve(&self, object_id: &str) -> Option<&str> {
        self.0.get(object_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
