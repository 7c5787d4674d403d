//! Per-file transfer state machine.
//!
//! `Pending -> Transferring -> {Completed | Cancelled | Failed}`. Once a
//! transfer reaches a terminal state no event changes it again.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use lanchat_shared::protocol::{PendingTransferDto, TransferProgressDto};
use lanchat_shared::types::{TransferDirection, TransferStatus};

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub file_id: i64,
    /// Backend row id, needed to resume. Known only for transfers loaded from
    /// the pending list.
    pub transfer_id: Option<i64>,
    pub file_name: String,
    /// Total size in bytes; 0 while unknown.
    pub size: u64,
    pub transferred: u64,
    /// Bytes per second, as last reported.
    pub speed: f64,
    pub status: TransferStatus,
    pub direction: TransferDirection,
    pub peer_addr: String,
    /// Request packet number for inbound offers.
    pub request_id: Option<String>,
    pub local_path: Option<String>,
}

impl Transfer {
    pub fn new(
        file_id: i64,
        file_name: impl Into<String>,
        size: u64,
        direction: TransferDirection,
        peer_addr: impl Into<String>,
    ) -> Self {
        Self {
            file_id,
            transfer_id: None,
            file_name: file_name.into(),
            size,
            transferred: 0,
            speed: 0.0,
            status: TransferStatus::Pending,
            direction,
            peer_addr: peer_addr.into(),
            request_id: None,
            local_path: None,
        }
    }

    /// Completion in whole percent, always within `0..=100`.
    pub fn percent(&self) -> u8 {
        if self.size == 0 {
            return if self.status == TransferStatus::Completed { 100 } else { 0 };
        }
        let pct = (self.transferred as f64 / self.size as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// Time left at the current speed; `None` when the speed or the total is
    /// unknown, or the estimate does not fit a `Duration`.
    pub fn remaining(&self) -> Option<Duration> {
        if self.size == 0 || self.speed <= 0.0 || !self.speed.is_finite() {
            return None;
        }
        let left = self.size.saturating_sub(self.transferred) as f64;
        Duration::try_from_secs_f64(left / self.speed).ok()
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

impl From<PendingTransferDto> for Transfer {
    fn from(dto: PendingTransferDto) -> Self {
        let size = dto.file_size;
        Self {
            file_id: dto.file_id,
            transfer_id: Some(dto.tid),
            file_name: dto.file_name,
            size,
            transferred: clamp_to_size(dto.transferred, size),
            speed: 0.0,
            status: dto.status,
            direction: dto.direction,
            peer_addr: dto.target_ip,
            request_id: None,
            local_path: Some(dto.file_path),
        }
    }
}

/// Partial progress report; only the supplied fields are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressUpdate {
    pub transferred: Option<u64>,
    pub total: Option<u64>,
    pub speed: Option<f64>,
}

impl From<&TransferProgressDto> for ProgressUpdate {
    fn from(dto: &TransferProgressDto) -> Self {
        Self {
            transferred: dto.transferred,
            total: dto.total,
            speed: dto.speed,
        }
    }
}

/// Result of applying a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    Updated,
    /// The transfer is already finished; the report was dropped.
    Ignored,
    /// No transfer with this id is tracked.
    Unknown,
}

/// Tracked transfers in the order they were registered.
#[derive(Debug, Default)]
pub struct TransferTracker {
    transfers: Vec<Transfer>,
}

impl TransferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn active(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter().filter(|t| t.is_active())
    }

    pub fn get(&self, file_id: i64) -> Option<&Transfer> {
        self.transfers.iter().find(|t| t.file_id == file_id)
    }

    /// Start tracking a transfer. A transfer already tracked under the same
    /// file id is replaced only if it is finished; an active one is kept.
    /// Returns whether the new entry was stored.
    pub fn register(&mut self, transfer: Transfer) -> bool {
        match self.transfers.iter().position(|t| t.file_id == transfer.file_id) {
            Some(idx) if self.transfers[idx].is_active() => {
                debug!(file_id = transfer.file_id, "Transfer already tracked");
                false
            }
            Some(idx) => {
                self.transfers[idx] = transfer;
                true
            }
            None => {
                self.transfers.push(transfer);
                true
            }
        }
    }

    /// Pending -> Transferring.
    pub fn start(&mut self, file_id: i64) -> Result<()> {
        let transfer = self.active_mut(file_id)?;
        if transfer.status == TransferStatus::Pending {
            transfer.status = TransferStatus::Transferring;
        }
        Ok(())
    }

    /// Merge a progress report. `transferred` is clamped to the total once
    /// the total is known.
    pub fn apply_progress(&mut self, file_id: i64, update: ProgressUpdate) -> ProgressOutcome {
        let Some(transfer) = self.transfers.iter_mut().find(|t| t.file_id == file_id) else {
            return ProgressOutcome::Unknown;
        };
        if transfer.status.is_terminal() {
            debug!(file_id, status = %transfer.status, "Progress for finished transfer ignored");
            return ProgressOutcome::Ignored;
        }

        if let Some(total) = update.total {
            transfer.size = total;
        }
        let transferred = update.transferred.unwrap_or(transfer.transferred);
        transfer.transferred = clamp_to_size(transferred, transfer.size);
        if let Some(speed) = update.speed {
            transfer.speed = if speed.is_finite() && speed > 0.0 { speed } else { 0.0 };
        }
        if transfer.status == TransferStatus::Pending && transfer.transferred > 0 {
            transfer.status = TransferStatus::Transferring;
        }
        ProgressOutcome::Updated
    }

    /// Mark a transfer completed. Returns `false` if it was already finished
    /// (a completion after cancellation is dropped).
    pub fn complete(&mut self, file_id: i64) -> Result<bool> {
        let transfer = self.get_mut(file_id)?;
        if transfer.status.is_terminal() {
            debug!(file_id, status = %transfer.status, "Completion for finished transfer ignored");
            return Ok(false);
        }
        transfer.status = TransferStatus::Completed;
        if transfer.size == 0 {
            transfer.size = transfer.transferred;
        } else {
            transfer.transferred = transfer.size;
        }
        transfer.speed = 0.0;
        info!(file_id, name = %transfer.file_name, "Transfer completed");
        Ok(true)
    }

    /// Mark a transfer failed. Returns `false` if it was already finished.
    pub fn fail(&mut self, file_id: i64, reason: &str) -> Result<bool> {
        let transfer = self.get_mut(file_id)?;
        if transfer.status.is_terminal() {
            return Ok(false);
        }
        transfer.status = TransferStatus::Failed;
        transfer.speed = 0.0;
        warn!(file_id, name = %transfer.file_name, reason, "Transfer failed");
        Ok(true)
    }

    /// Cancel a transfer from any non-terminal state.
    ///
    /// Cancelling twice is a no-op; cancelling a completed or failed transfer
    /// is an error. Returns whether the status changed.
    pub fn cancel(&mut self, file_id: i64) -> Result<bool> {
        let transfer = self.get_mut(file_id)?;
        match transfer.status {
            TransferStatus::Cancelled => Ok(false),
            status @ (TransferStatus::Completed | TransferStatus::Failed) => {
                Err(StoreError::TransferFinished { file_id, status })
            }
            TransferStatus::Pending | TransferStatus::Transferring => {
                transfer.status = TransferStatus::Cancelled;
                transfer.speed = 0.0;
                info!(file_id, name = %transfer.file_name, "Transfer cancelled");
                Ok(true)
            }
        }
    }

    /// Drop finished transfers from the list.
    pub fn prune_finished(&mut self) -> usize {
        let before = self.transfers.len();
        self.transfers.retain(Transfer::is_active);
        before - self.transfers.len()
    }

    fn get_mut(&mut self, file_id: i64) -> Result<&mut Transfer> {
        self.transfers
            .iter_mut()
            .find(|t| t.file_id == file_id)
            .ok_or(StoreError::UnknownTransfer(file_id))
    }

    fn active_mut(&mut self, file_id: i64) -> Result<&mut Transfer> {
        let transfer = self.get_mut(file_id)?;
        if transfer.status.is_terminal() {
            return Err(StoreError::TransferFinished {
                file_id,
                status: transfer.status,
            });
        }
        Ok(transfer)
    }
}

/// A size of 0 means the total is not known yet.
fn clamp_to_size(transferred: u64, size: u64) -> u64 {
    if size == 0 {
        transferred
    } else {
        transferred.min(size)
    }
}
