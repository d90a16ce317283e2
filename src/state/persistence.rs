//! 模块开关持久化（可选、尽力而为）
//!
//! 单文件 JSON，只保存 voice/hand 两个开关；凭证、就绪、错误不落盘。
//! 授权服务重启时如果配置了状态文件则恢复开关，否则一切从默认值开始。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::ControlState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub voice_active: bool,
    #[serde(default)]
    pub hand_active: bool,
}

impl From<&ControlState> for PersistedState {
    fn from(state: &ControlState) -> Self {
        Self {
            voice_active: state.active.voice,
            hand_active: state.active.hand,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件不存在时返回 None
    pub fn load(&self) -> anyhow::Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// 异步写入；父目录不存在时自动创建
    pub async fn save(&self, state: &ControlState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let persisted = PersistedState::from(state);
        tokio::fs::write(&self.path, serde_json::to_string_pretty(&persisted)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("absent.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_switches() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("nested/system_status.json"));

        let mut state = ControlState::default();
        state.active.hand = true;
        state.credential = Some(crate::state::Token::new("never-on-disk"));
        file.save(&state).await.unwrap();

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(!raw.contains("never-on-disk"));

        let loaded = file.load().unwrap().unwrap();
        assert_eq!(
            loaded,
            PersistedState {
                voice_active: false,
                hand_active: true
            }
        );
    }

    #[tokio::test]
    async fn test_save_creates_nested_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("a/b/system_status.json"));

        let mut state = ControlState::default();
        state.active.voice = true;
        file.save(&state).await.unwrap();

        let loaded = file.load().unwrap().unwrap();
        assert!(loaded.voice_active);
        assert!(!loaded.hand_active);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(StateFile::new(&path).load().is_err());
    }
}
