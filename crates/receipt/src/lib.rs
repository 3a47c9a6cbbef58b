pub mod classifier;
pub mod stub;

pub use classifier::{Classification, ReceiptClassifier, RejectionReason};
pub use stub::StubRecognizer;
