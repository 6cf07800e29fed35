use std::sync::{Arc, atomic::AtomicBool};

use log::{error, warn};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    OsSigInt,
    OsSigQuit,
    OsSigTerm,
    UserInt,
}

impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OsSigInt => write!(f, "an os sig int"),
            Self::OsSigQuit => write!(f, "an os sig quit"),
            Self::OsSigTerm => write!(f, "an os sig term"),
            Self::UserInt => write!(f, "a user request"),
        }
    }
}

const FORCE_QUIT_THRESHOLD: u8 = 3;

#[derive(Debug)]
/// The receiving side of the termination broadcast channel.
///
/// Listens for interrupt signals, and remembers whether one has been received.
pub struct InterruptReceiver {
    interrupt_rx: broadcast::Receiver<Interrupted>,
    stopped: Arc<AtomicBool>,
}

impl InterruptReceiver {
    #[must_use]
    pub fn new(interrupt_rx: broadcast::Receiver<Interrupted>) -> Self {
        Self {
            interrupt_rx,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wait for an interrupt signal to be received.
    ///
    /// # Errors
    ///
    /// Fails if the interrupt signal cannot be received (e.g. the sender has been dropped)
    pub async fn wait(&mut self) -> Result<Interrupted, broadcast::error::RecvError> {
        let interrupted = self.interrupt_rx.recv().await?;

        self.stopped
            .store(true, std::sync::atomic::Ordering::SeqCst);

        Ok(interrupted)
    }

    /// Check if an interrupt signal has been received previously.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
/// The sending side of the termination broadcast channel.
pub struct Terminator {
    interrupt_tx: broadcast::Sender<Interrupted>,
}

impl Terminator {
    #[must_use]
    pub const fn new(interrupt_tx: broadcast::Sender<Interrupted>) -> Self {
        Self { interrupt_tx }
    }

    /// Send an interrupt signal to the application.
    ///
    /// # Errors
    ///
    /// Fails if the interrupt signal cannot be sent (e.g. the receiver has been dropped)
    pub fn terminate(&self, interrupted: Interrupted) -> anyhow::Result<()> {
        self.interrupt_tx.send(interrupted)?;

        Ok(())
    }

    fn forward(&self, interrupted: Interrupted) {
        if let Err(e) = self.terminate(interrupted) {
            warn!("failed to forward {interrupted}: {e}");
        }
    }
}

#[cfg(unix)]
async fn terminate_by_signal(terminator: Terminator) {
    let signals = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    );
    let (Ok(mut interrupt_signal), Ok(mut term_signal), Ok(mut quit_signal)) = signals else {
        error!("failed to listen for os signals, only ctrl-c will stop the daemon");
        return terminate_by_ctrl_c(terminator).await;
    };

    let mut kill_count = 0;

    loop {
        // after enough signals, stop waiting for a graceful shutdown
        if kill_count >= FORCE_QUIT_THRESHOLD {
            warn!("Received {FORCE_QUIT_THRESHOLD} signals, forcefully terminating the application");
            std::process::exit(1);
        }

        tokio::select! {
            _ = interrupt_signal.recv() => terminator.forward(Interrupted::OsSigInt),
            _ = term_signal.recv() => terminator.forward(Interrupted::OsSigTerm),
            _ = quit_signal.recv() => terminator.forward(Interrupted::OsSigQuit),
            _ = tokio::signal::ctrl_c() => terminator.forward(Interrupted::UserInt),
        }
        kill_count += 1;
    }
}

#[cfg(not(unix))]
async fn terminate_by_signal(terminator: Terminator) {
    terminate_by_ctrl_c(terminator).await;
}

async fn terminate_by_ctrl_c(terminator: Terminator) {
    let mut kill_count = 0;

    loop {
        if kill_count >= FORCE_QUIT_THRESHOLD {
            warn!("Received {FORCE_QUIT_THRESHOLD} signals, forcefully terminating the application");
            std::process::exit(1);
        }

        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
            return;
        }
        terminator.forward(Interrupted::UserInt);
        kill_count += 1;
    }
}

/// Create the broadcast channel that carries the daemon's kill signal,
/// and start forwarding os signals into it.
///
/// Must be called from within a tokio runtime.
#[allow(clippy::module_name_repetitions)]
#[must_use]
pub fn create_termination() -> (Terminator, InterruptReceiver) {
    let (tx, rx) = broadcast::channel(2);
    let terminator = Terminator::new(tx);
    let interrupt = InterruptReceiver::new(rx);

    tokio::spawn(terminate_by_signal(terminator.clone()));

    (terminator, interrupt)
}
