use thiserror::Error;

/// 呼び出し元に見えるエラー。種類はこの2つだけ。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// 必須入力が欠けている、または空。再試行しても結果は変わらない。
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// 画像として解釈できないなど、段の振り分け前に起きた失敗。
    #[error("image processing error: {0}")]
    Processing(String),
}

/// 外部分類器の内部失敗。パイプラインの外には出ず、次の段への昇格に変換される。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("output shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("non-finite value in model output")]
    NonFinite,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid model input: {0}")]
    Input(String),
}

/// HTTP リスナー周りのエラー。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
