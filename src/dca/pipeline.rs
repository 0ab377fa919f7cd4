//! The one-shot `createDCA` run.
//!
//! ```text
//! load credential ─▶ load descriptor ─▶ verify chain ─▶ nonce ─▶ journal check
//!        ─▶ gas price ─▶ trial encode ─▶ generate deposit key ─▶ build ─▶ sign
//!        ─▶ journal(signed) ─▶ broadcast ─▶ journal(submitted) ─▶ [wait for receipt]
//! ```
//!
//! Everything before "generate deposit key" is read-only, so a bad key file,
//! descriptor, parameter, endpoint, chain or gas price aborts without leaving
//! anything behind.

use alloy::primitives::{Address, Bytes, TxHash};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::{
    BlockchainClient, BlockchainError, ConfirmationStatus, ContractDescriptor, Credential,
    FeeSettings, SignedEnvelope, TxBuilder,
};
use crate::config::SubmitterConfig;
use crate::dca::types::{CallParameters, ParameterError};
use crate::storage::{
    EntryStatus, JournalCheck, JournalEntry, KeyStore, StorageError, SubmissionJournal,
};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid DCA parameters: {0}")]
    Parameters(#[from] ParameterError),

    #[error("Contract address is not configured")]
    MissingContract,

    #[error(
        "Nonce {nonce} was already used for transaction {tx_hash} (run {run_id}); rerun with --force to send another"
    )]
    AlreadySubmitted {
        nonce: u64,
        tx_hash: TxHash,
        run_id: Uuid,
    },
}

/// Result type for a run.
pub type RunResult<T> = Result<T, RunError>;

/// Switches for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Build and sign only; nothing is persisted or broadcast.
    pub dry_run: bool,
    /// Poll for a receipt after broadcasting.
    pub wait_for_confirmation: bool,
    /// Ignore journal entries showing an earlier submission.
    pub force: bool,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub sender: Address,
    pub nonce: u64,
    pub deposit_address: Address,
    /// Where the deposit key went; `None` for dry runs and resumed runs.
    pub key_location: Option<String>,
    pub tx_hash: TxHash,
    pub raw_tx: Bytes,
    /// False for dry runs.
    pub broadcast: bool,
    /// True when an interrupted earlier run was re-broadcast.
    pub resumed: bool,
    pub confirmation: ConfirmationStatus,
}

/// Generate a deposit credential and hand it to `store`.
pub fn generate_deposit_credential(store: &dyn KeyStore) -> RunResult<(Credential, String)> {
    let credential = Credential::generate();
    let location = store.store(&credential)?;
    tracing::info!(
        address = %credential.address(),
        location = %location,
        "Deposit credential generated"
    );
    Ok((credential, location))
}

/// One `createDCA` submission.
pub struct DcaRun<'a> {
    config: &'a SubmitterConfig,
    key_store: &'a dyn KeyStore,
    options: RunOptions,
    run_id: Uuid,
}

impl<'a> DcaRun<'a> {
    pub fn new(config: &'a SubmitterConfig, key_store: &'a dyn KeyStore, options: RunOptions) -> Self {
        Self {
            config,
            key_store,
            options,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Execute the pipeline. Stops at the first failure.
    pub async fn execute(&self) -> RunResult<RunReport> {
        let span = tracing::info_span!("create_dca", run_id = %self.run_id);
        self.execute_inner().instrument(span).await
    }

    async fn execute_inner(&self) -> RunResult<RunReport> {
        let config = self.config;

        // Local, read-only inputs first
        let credential = Credential::load(&config.secrets.key_file)?;
        let descriptor = ContractDescriptor::load(&config.contract.abi_path)?;
        let function = descriptor.function(&config.contract.function)?;
        let contract = config.contract.address.ok_or(RunError::MissingContract)?;
        let client = BlockchainClient::new(config.blockchain.clone())?;

        // Read-only network checks
        client.verify_chain_id().await?;
        let sender = credential.address();
        let nonce = client.get_transaction_count(sender).await?;
        tracing::info!(sender = %sender, nonce = nonce, "Account nonce fetched");

        let mut journal = match (config.secrets.journal(), self.options.dry_run) {
            (Some(path), false) => Some(SubmissionJournal::open(path)?),
            _ => None,
        };

        if let Some(journal) = journal.as_mut() {
            match journal.check(config.blockchain.chain_id, contract, sender, nonce) {
                JournalCheck::Fresh => {}
                JournalCheck::AlreadySubmitted(entry) if !self.options.force => {
                    return Err(RunError::AlreadySubmitted {
                        nonce: entry.nonce,
                        tx_hash: entry.tx_hash,
                        run_id: entry.run_id,
                    });
                }
                JournalCheck::AlreadySubmitted(entry) => {
                    tracing::warn!(
                        tx_hash = %entry.tx_hash,
                        "Earlier submission recorded, continuing because of --force"
                    );
                }
                JournalCheck::Resumable(entry) => {
                    return self.resume(&client, journal, entry).await;
                }
            }
        }

        let fees = FeeSettings {
            gas_limit: config.blockchain.gas_limit,
            gas_price: client.resolve_gas_price().await?,
        };
        let builder = TxBuilder::new(function, contract, config.blockchain.chain_id, fees);

        // Trial encode with a placeholder deposit address; no key exists yet
        let trial = CallParameters::from_config(&config.dca, Address::ZERO)?;
        builder.build(&trial.arguments(), nonce)?;

        // Mutating steps from here on
        let (deposit, key_location) = if self.options.dry_run {
            (Credential::generate(), None)
        } else {
            let (deposit, location) = generate_deposit_credential(self.key_store)?;
            (deposit, Some(location))
        };

        let params = CallParameters {
            deposit_address: deposit.address(),
            ..trial
        };
        let unsigned = builder.build(&params.arguments(), nonce)?;
        let signed = credential.sign_transaction(unsigned).await?;

        let mut report = RunReport {
            run_id: self.run_id,
            sender,
            nonce,
            deposit_address: deposit.address(),
            key_location,
            tx_hash: signed.tx_hash(),
            raw_tx: signed.raw(),
            broadcast: false,
            resumed: false,
            confirmation: ConfirmationStatus::Pending,
        };

        if self.options.dry_run {
            tracing::info!(tx_hash = %report.tx_hash, "Dry run, transaction not broadcast");
            return Ok(report);
        }

        if let Some(journal) = journal.as_mut() {
            journal.record(JournalEntry {
                run_id: self.run_id,
                chain_id: config.blockchain.chain_id,
                contract,
                sender,
                nonce,
                deposit_address: deposit.address(),
                tx_hash: signed.tx_hash(),
                raw_tx: report.raw_tx.clone(),
                status: EntryStatus::Signed,
                updated_at: 0,
            })?;
        }

        report.tx_hash = self
            .broadcast(&client, journal.as_mut(), &signed, self.run_id)
            .await?;
        report.broadcast = true;
        report.confirmation = self
            .confirm(&client, journal.as_mut(), report.tx_hash, self.run_id)
            .await?;
        Ok(report)
    }

    /// Re-broadcast the transaction of an interrupted run.
    async fn resume(
        &self,
        client: &BlockchainClient,
        journal: &mut SubmissionJournal,
        entry: JournalEntry,
    ) -> RunResult<RunReport> {
        tracing::warn!(
            previous_run = %entry.run_id,
            tx_hash = %entry.tx_hash,
            nonce = entry.nonce,
            "Resuming interrupted run, re-broadcasting its signed transaction"
        );

        let signed = SignedEnvelope::decode(&entry.raw_tx)?;
        let tx_hash = self.broadcast(client, Some(&mut *journal), &signed, entry.run_id).await?;
        let confirmation = self.confirm(client, Some(journal), tx_hash, entry.run_id).await?;

        Ok(RunReport {
            run_id: entry.run_id,
            sender: entry.sender,
            nonce: entry.nonce,
            deposit_address: entry.deposit_address,
            key_location: None,
            tx_hash,
            raw_tx: entry.raw_tx,
            broadcast: true,
            resumed: true,
            confirmation,
        })
    }

    async fn broadcast(
        &self,
        client: &BlockchainClient,
        journal: Option<&mut SubmissionJournal>,
        signed: &SignedEnvelope,
        run_id: Uuid,
    ) -> RunResult<TxHash> {
        match client.submit(signed).await {
            Ok(tx_hash) => {
                if let Some(journal) = journal {
                    journal.set_status(run_id, EntryStatus::Submitted)?;
                }
                Ok(tx_hash)
            }
            Err(e @ BlockchainError::Submission(_)) => {
                if let Some(journal) = journal {
                    journal.set_status(run_id, EntryStatus::Failed)?;
                }
                Err(e.into())
            }
            // Timeout or lost reply: the entry stays `signed` so the next run
            // resumes it, or sees the nonce moved on and refuses
            Err(e) => Err(e.into()),
        }
    }

    async fn confirm(
        &self,
        client: &BlockchainClient,
        journal: Option<&mut SubmissionJournal>,
        tx_hash: TxHash,
        run_id: Uuid,
    ) -> RunResult<ConfirmationStatus> {
        if !self.options.wait_for_confirmation {
            return Ok(ConfirmationStatus::Pending);
        }

        let status = client
            .wait_for_confirmation(tx_hash, self.config.blockchain.confirmation_timeout_secs)
            .await?;

        if let Some(journal) = journal {
            match &status {
                ConfirmationStatus::Confirmed { .. } => {
                    journal.set_status(run_id, EntryStatus::Confirmed)?
                }
                ConfirmationStatus::Failed(_) => journal.set_status(run_id, EntryStatus::Failed)?,
                ConfirmationStatus::Pending => {}
            }
        }

        tracing::info!(tx_hash = %tx_hash, status = ?status, "Confirmation finished");
        Ok(status)
    }
}
