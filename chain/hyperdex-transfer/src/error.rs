#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("transfer sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },
}
