//! セッション状態機械
use std::fmt;

/// セッションのライフサイクル状態
///
/// 正常系は `Idle → Connecting → Open → Streaming → Closing → Closed` と
/// 単調に進み、`Error` は非終端の任意の状態から到達します。
/// `Closed` と `Error` は終端で、そこから出る遷移はありません。
/// 新しい対話には新しいコントローラを作ります。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Streaming,
    Closing,
    Closed,
    Error,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Streaming => "streaming",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
            SessionState::Error => "error",
        };
        f.write_str(name)
    }
}
