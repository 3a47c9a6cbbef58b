//! Heuristic "verification" of uploaded payment screenshots.
//!
//! The pipeline is keyword and pattern matching over whatever text the OCR
//! collaborator hands back, nothing more. That permissiveness is the
//! contract: any screenshot whose text carries a success keyword and a
//! hash-shaped token passes. It is a demo prop, not a fraud control, and
//! it must stay that way.

use copysim_core::TextRecognizer;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Keywords that count as payment confirmation, matched on lowercased text.
const SUCCESS_KEYWORDS: [&str; 5] = ["success", "completed", "confirmed", "successful", "sent"];

/// Literal fallbacks accepted when no hash-shaped token is present.
const HASH_FALLBACKS: [&str; 3] = ["hash", "txid", "transaction id"];

/// Why a screenshot was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// None of the success keywords appeared in the extracted text.
    NoSuccessKeyword,
    /// No hash-shaped token and none of the literal fallbacks.
    NoTransactionHash,
    /// The OCR collaborator failed; no text to judge.
    Unreadable,
}

/// Verdict on one uploaded screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Whether the screenshot passed the heuristics.
    pub is_valid: bool,
    /// Amount recovered from the text; zero when none was found.
    pub detected_amount: Decimal,
    /// User-facing one-liner describing the verdict.
    pub summary: String,
    /// Present on invalid classifications.
    pub rejection: Option<RejectionReason>,
}

impl Classification {
    fn rejected(reason: RejectionReason) -> Self {
        let summary = match reason {
            RejectionReason::NoSuccessKeyword => {
                "Rejected: no payment confirmation found. Please upload a clearer screenshot."
                    .to_string()
            }
            RejectionReason::NoTransactionHash => {
                "Rejected: no transaction hash found. Please upload a clearer screenshot."
                    .to_string()
            }
            RejectionReason::Unreadable => "Error: could not read image".to_string(),
        };
        Self {
            is_valid: false,
            detected_amount: Decimal::ZERO,
            summary,
            rejection: Some(reason),
        }
    }

    /// True when the caller should credit the account: a valid verdict
    /// with a concrete amount.
    #[must_use]
    pub fn credits_account(&self) -> bool {
        self.is_valid && self.detected_amount > Decimal::ZERO
    }
}

/// Classifier over a black-box text recognizer.
pub struct ReceiptClassifier {
    recognizer: Arc<dyn TextRecognizer>,
    hex_hash: Regex,
    tron_hash: Regex,
    amount: Regex,
}

impl ReceiptClassifier {
    /// Builds the classifier, compiling its patterns once.
    ///
    /// # Panics
    /// Never in practice; the patterns are fixed and known-good.
    #[must_use]
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            // 0x-prefixed 64-hex-digit transaction hash (EVM style).
            hex_hash: Regex::new(r"0x[0-9a-f]{64}").expect("hex hash pattern"),
            // T-prefixed 33-char alphanumeric token (TRON style).
            tron_hash: Regex::new(r"\bt[0-9a-z]{32}\b").expect("tron hash pattern"),
            // "$" or "usdt" followed by a numeric token, commas allowed.
            amount: Regex::new(r"(?:\$|usdt)\s*([0-9][0-9,]*(?:\.[0-9]+)?)")
                .expect("amount pattern"),
        }
    }

    /// Runs OCR and classifies the extracted text.
    ///
    /// Never fails: a recognizer error becomes an invalid verdict with the
    /// "could not read image" summary.
    pub async fn classify(&self, image: &[u8], mime: &str) -> Classification {
        match self.recognizer.recognize_text(image, mime).await {
            Ok(text) => self.classify_text(&text),
            Err(err) => {
                tracing::warn!(%err, mime, "text recognition failed");
                Classification::rejected(RejectionReason::Unreadable)
            }
        }
    }

    /// The pure classification pipeline, in contract order: success
    /// keyword, hash-shaped token (or literal fallback), then a best-effort
    /// amount grab.
    #[must_use]
    pub fn classify_text(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();

        if !SUCCESS_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Classification::rejected(RejectionReason::NoSuccessKeyword);
        }

        let has_hash = self.hex_hash.is_match(&lower)
            || self.tron_hash.is_match(&lower)
            || HASH_FALLBACKS.iter().any(|k| lower.contains(k));
        if !has_hash {
            return Classification::rejected(RejectionReason::NoTransactionHash);
        }

        let detected_amount = self
            .amount
            .captures(&lower)
            .and_then(|captures| Decimal::from_str(&captures[1].replace(',', "")).ok())
            .unwrap_or(Decimal::ZERO);

        let summary = if detected_amount > Decimal::ZERO {
            format!("Verified: ${detected_amount} Transfer Confirmed.")
        } else {
            "Verified: Transaction Valid (Amount check manual).".to_string()
        };

        Classification {
            is_valid: true,
            detected_amount,
            summary,
            rejection: None,
        }
    }
}
