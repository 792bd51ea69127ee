use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("pcm payload has odd byte length: {len}")]
    OddLength { len: usize },
    #[error("transport text is not valid base64")]
    InvalidText {
        #[source]
        source: base64::DecodeError,
    },
}
