//! Service layer API for prefixed, sequential numbers
use super::config::NumberingConfig;
use super::error::SequenceError;
use super::keys;
use super::locks::RowLocks;
use super::sequence::{NumberFormat, Purpose, SequenceEntry, SequenceNumber};
use sled::transaction::ConflictableTransactionError;
use sled::{Db, Tree};
use std::sync::Arc;
use std::time::Duration;

const SEQUENCES_TREE: &str = "party_sequences";

pub struct SequenceService {
    sequences: Tree,
    locks: RowLocks,
    format: NumberFormat,
    lock_timeout: Duration,
    durable_commits: bool,
}

impl SequenceService {
    pub fn new(instance: Arc<Db>) -> Result<Self, SequenceError> {
        Self::with_config(instance, &NumberingConfig::default())
    }

    pub fn with_config(instance: Arc<Db>, config: &NumberingConfig) -> Result<Self, SequenceError> {
        Ok(Self {
            sequences: instance.open_tree(SEQUENCES_TREE)?,
            locks: RowLocks::new(),
            format: config.number_format(),
            lock_timeout: config.lock_timeout(),
            durable_commits: config.durable_commits,
        })
    }

    /// Skip flushing after each increment. Issued numbers are then only as
    /// durable as sled's background flush.
    pub fn without_durable_commits(mut self) -> Self {
        self.durable_commits = false;
        self
    }

    /// Create a sequence for that party and purpose, starting at zero.
    pub fn create_sequence(
        &self,
        party_id: &str,
        purpose: Purpose,
        prefix: &str,
    ) -> Result<SequenceEntry, SequenceError> {
        if prefix.trim().is_empty() {
            return Err(SequenceError::InvalidPrefix);
        }
        let key = sequence_key(party_id, purpose)?;
        let entry = SequenceEntry::new(party_id, purpose, prefix);
        let encoded = encode(&entry)?;

        // insert only if absent
        let swapped = self
            .sequences
            .compare_and_swap(key, None as Option<&[u8]>, Some(encoded))?;
        if swapped.is_err() {
            return Err(SequenceError::DuplicateSequence {
                party_id: party_id.to_string(),
                purpose,
            });
        }
        if self.durable_commits {
            self.sequences.flush()?;
        }

        tracing::info!(party_id, %purpose, prefix, "created sequence");
        Ok(entry)
    }

    /// Reserve the next number for the party and purpose.
    ///
    /// Increments are serialized per (party, purpose): the row lock is held
    /// from the read until the incremented value is committed. A failure
    /// before the commit leaves the stored value untouched.
    ///
    /// With durable commits the tree is flushed as part of the commit. A
    /// failing flush is reported as an error although the increment already
    /// took effect, so that value is skipped rather than handed out twice.
    pub fn generate_number(
        &self,
        party_id: &str,
        purpose: Purpose,
    ) -> Result<SequenceNumber, SequenceError> {
        self.reserve(party_id, purpose, missing_sequence)
    }

    fn reserve(
        &self,
        party_id: &str,
        purpose: Purpose,
        missing: fn(&str, Purpose) -> String,
    ) -> Result<SequenceNumber, SequenceError> {
        let key = sequence_key(party_id, purpose)?;

        // unknown keys must not take a slot in the lock table
        if !self.sequences.contains_key(&key)? {
            return Err(SequenceError::NumberGenerationFailed {
                reason: missing(party_id, purpose),
            });
        }

        let row = self.locks.row(&key);
        let _guard =
            row.try_lock_for(self.lock_timeout)
                .ok_or_else(|| SequenceError::LockTimeout {
                    party_id: party_id.to_string(),
                    purpose,
                })?;

        let number_format = self.format;
        let durable_commits = self.durable_commits;
        let (prefix, value) = self.sequences.transaction(|tx| {
            let Some(bytes) = tx.get(&key)? else {
                return abort(SequenceError::NumberGenerationFailed {
                    reason: missing(party_id, purpose),
                });
            };
            let mut entry: SequenceEntry =
                minicbor::decode(&bytes).map_err(|e| abort_encoding(e.to_string()))?;

            if entry.prefix.is_empty() {
                return abort(SequenceError::NumberGenerationFailed {
                    reason: missing_prefix(party_id, purpose),
                });
            }

            let next = entry
                .value
                .checked_add(1)
                .filter(|next| number_format.admits(*next));
            let Some(next) = next else {
                return abort(SequenceError::NumberGenerationFailed {
                    reason: format!(
                        "The {purpose} sequence of party \"{party_id}\" is exhausted at {}.",
                        entry.value
                    ),
                });
            };

            entry.value = next;
            let encoded = minicbor::to_vec(&entry).map_err(|e| abort_encoding(e.to_string()))?;
            tx.insert(key.as_slice(), encoded)?;
            if durable_commits {
                tx.flush();
            }

            Ok((entry.prefix, next))
        })?;

        let number = number_format.render(&prefix, value);
        tracing::debug!(party_id, %purpose, number = %number, "reserved sequence number");
        Ok(number)
    }

    /// Return the prefix configured for the party and purpose, if any.
    pub fn get_prefix(
        &self,
        party_id: &str,
        purpose: Purpose,
    ) -> Result<Option<String>, SequenceError> {
        Ok(self
            .find_sequence(party_id, purpose)?
            .map(|entry| entry.prefix))
    }

    pub fn find_sequence(
        &self,
        party_id: &str,
        purpose: Purpose,
    ) -> Result<Option<SequenceEntry>, SequenceError> {
        let key = sequence_key(party_id, purpose)?;
        self.sequences
            .get(key)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// All sequences configured for the party, ordered by purpose.
    pub fn list_sequences(&self, party_id: &str) -> Result<Vec<SequenceEntry>, SequenceError> {
        let prefix = keys::family_prefix(party_id)?;
        let mut entries = self
            .sequences
            .scan_prefix(prefix)
            .values()
            .map(|bytes| decode(&bytes?))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.purpose);
        Ok(entries)
    }

    /// Generate and reserve an unused, unique article number for this party.
    pub fn generate_article_number(&self, party_id: &str) -> Result<SequenceNumber, SequenceError> {
        self.generate_with_configured_prefix(party_id, Purpose::Article)
    }

    /// Generate and reserve an unused, unique order number for this party.
    pub fn generate_order_number(&self, party_id: &str) -> Result<SequenceNumber, SequenceError> {
        self.generate_with_configured_prefix(party_id, Purpose::Order)
    }

    pub fn get_article_number_prefix(&self, party_id: &str) -> Result<Option<String>, SequenceError> {
        self.get_prefix(party_id, Purpose::Article)
    }

    pub fn get_order_number_prefix(&self, party_id: &str) -> Result<Option<String>, SequenceError> {
        self.get_prefix(party_id, Purpose::Order)
    }

    fn generate_with_configured_prefix(
        &self,
        party_id: &str,
        purpose: Purpose,
    ) -> Result<SequenceNumber, SequenceError> {
        self.reserve(party_id, purpose, missing_prefix)
    }
}

fn missing_sequence(party_id: &str, purpose: Purpose) -> String {
    format!("No sequence configured for party \"{party_id}\" and purpose \"{purpose}\".")
}

fn missing_prefix(party_id: &str, purpose: Purpose) -> String {
    format!("No {purpose} number prefix is configured for party \"{party_id}\".")
}

fn sequence_key(party_id: &str, purpose: Purpose) -> Result<Vec<u8>, SequenceError> {
    Ok(keys::composite_key(party_id, purpose.name().as_bytes())?)
}

fn encode(entry: &SequenceEntry) -> Result<Vec<u8>, SequenceError> {
    minicbor::to_vec(entry).map_err(|e| SequenceError::Encoding(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<SequenceEntry, SequenceError> {
    minicbor::decode(bytes).map_err(|e| SequenceError::Encoding(e.to_string()))
}

fn abort<T>(err: SequenceError) -> Result<T, ConflictableTransactionError<SequenceError>> {
    Err(ConflictableTransactionError::Abort(err))
}

fn abort_encoding(message: String) -> ConflictableTransactionError<SequenceError> {
    ConflictableTransactionError::Abort(SequenceError::Encoding(message))
}
