//! 設定読み込みの失敗要因
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// 設定ルートが無い。`audio_io.yaml` と `session.yaml` を置いた
    /// ディレクトリを指すこと
    #[error("configuration directory not found: {0:?} (expected to contain audio_io.yaml and session.yaml)")]
    MissingRoot(PathBuf),
    #[error("failed to read configuration file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in configuration file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
