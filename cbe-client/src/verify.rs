//! Orchestration: input checks, fetch, parse, reconcile.
//!
//! Every failure ends as an explicit [`VerificationOutcome`]; nothing is
//! retried.

use cbe_core::{
    reconcile, ClaimedTransaction, OfficialReceipt, Reconciliation, VerificationOutcome, VerifyError,
};
use cbe_ingest::{parse_receipt, LopdfDecoder, RowDecoder};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{info, warn};

use crate::fetch::{FetchConfig, ReceiptFetcher, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Attach the official receipt to a successful outcome
    pub include_details: bool,
    /// Request timeout; 0 means the default
    pub timeout_secs: u64,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            include_details: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyRequest {
    pub claim: ClaimedTransaction,
    pub options: VerifyOptions,
}

pub struct Verifier<D = LopdfDecoder> {
    fetcher: ReceiptFetcher,
    decoder: D,
}

impl Verifier<LopdfDecoder> {
    pub fn new(config: FetchConfig) -> Result<Self, VerifyError> {
        Ok(Self::with_decoder(ReceiptFetcher::new(config)?, LopdfDecoder))
    }
}

impl<D: RowDecoder> Verifier<D> {
    pub fn with_decoder(fetcher: ReceiptFetcher, decoder: D) -> Self {
        Self { fetcher, decoder }
    }

    /// Run the pipeline up to reconciliation. Structural failures are errors.
    pub async fn check(
        &self,
        claim: &ClaimedTransaction,
    ) -> Result<(Reconciliation, OfficialReceipt), VerifyError> {
        claim.validate()?;
        let bytes = self.fetcher.fetch(&claim.id, &claim.suffix).await?;
        let official = parse_receipt(&self.decoder, &bytes)?;
        Ok((reconcile(claim, &official), official))
    }

    pub async fn verify(&self, claim: &ClaimedTransaction, include_details: bool) -> VerificationOutcome {
        match self.check(claim).await {
            Ok((rec, official)) if rec.ok => {
                info!(reference = %official.reference, "transaction verified");
                VerificationOutcome::verified(include_details.then_some(official))
            }
            Ok((rec, _)) => {
                info!(mismatches = rec.mismatches.len(), "transaction verification failed");
                VerificationOutcome::mismatched(rec.mismatches)
            }
            Err(err) => {
                warn!(category = ?err.category(), error = %err, "verification aborted");
                VerificationOutcome::failed(err)
            }
        }
    }

    /// Synchronous wrapper around [`Verifier::verify`]. Safe to call from any
    /// context, including inside a current-thread runtime.
    pub fn verify_blocking(&self, claim: &ClaimedTransaction, include_details: bool) -> VerificationOutcome
    where
        D: Sync,
    {
        if let Err(err) = claim.validate() {
            return VerificationOutcome::failed(err);
        }

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(self.verify(claim, include_details)))
            }
            // block_in_place panics on a current-thread runtime; run on a
            // separate thread with its own runtime instead.
            Ok(_) => std::thread::scope(|s| {
                s.spawn(|| self.verify_on_new_runtime(claim, include_details))
                    .join()
                    .unwrap_or_else(|_| VerificationOutcome::structural("verification thread panicked"))
            }),
            Err(_) => self.verify_on_new_runtime(claim, include_details),
        }
    }

    fn verify_on_new_runtime(&self, claim: &ClaimedTransaction, include_details: bool) -> VerificationOutcome {
        match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(self.verify(claim, include_details)),
            Err(e) => VerificationOutcome::structural(format!("create tokio runtime: {e}")),
        }
    }
}

/// Verify one claim against the default receipt server.
pub async fn verify(request: &VerifyRequest) -> VerificationOutcome {
    if let Err(err) = request.claim.validate() {
        return VerificationOutcome::failed(err);
    }
    let config = FetchConfig::default().with_timeout_secs(request.options.timeout_secs);
    match Verifier::new(config) {
        Ok(verifier) => verifier.verify(&request.claim, request.options.include_details).await,
        Err(err) => VerificationOutcome::failed(err),
    }
}

pub fn verify_blocking(request: &VerifyRequest) -> VerificationOutcome {
    if let Err(err) = request.claim.validate() {
        return VerificationOutcome::failed(err);
    }
    let config = FetchConfig::default().with_timeout_secs(request.options.timeout_secs);
    match Verifier::new(config) {
        Ok(verifier) => verifier.verify_blocking(&request.claim, request.options.include_details),
        Err(err) => VerificationOutcome::failed(err),
    }
}
