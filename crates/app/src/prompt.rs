//! One-shot installation offer.
//!
//! Owned replacement for a shared mutable "deferred prompt" handle: the
//! offer exists at most once per run and accepting consumes it, so there is
//! a single writer by construction.

use taskshell_client::{Fetch, ShellWorker};
use taskshell_core::Error;

/// Pending offer to mirror the shell for offline use.
pub struct InstallPrompt(());

impl InstallPrompt {
    /// An offer exists only while the current generation is not yet
    /// mirrored.
    pub fn when_missing(installed: bool) -> Option<Self> {
        if installed { None } else { Some(Self(())) }
    }

    /// Accept the offer: populate the shell mirror. Consumes the prompt so
    /// it cannot fire twice.
    pub async fn accept<N: Fetch>(self, worker: &mut ShellWorker<N>) -> Result<(), Error> {
        worker.install().await?;
        eprintln!("Shell mirrored for offline use ({}).", worker.version());
        Ok(())
    }
}
