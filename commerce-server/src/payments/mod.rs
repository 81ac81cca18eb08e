//! Payment Ledger & Verification
//!
//! - [`PaymentLedger`] - 凭证提交、财务审核、查询
//! - [`state`] - 付款状态迁移规则
//! - [`media`] - 凭证文件类型 / 大小校验
//! - [`storage`] - 凭证存储接口与本地实现

pub mod ledger;
pub mod media;
pub mod state;
pub mod storage;

pub use ledger::{PaymentLedger, ProofFile, ProofSubmission};
pub use storage::{LocalProofStorage, ProofStorage, ProofUpload, StorageError, StoredProof};
