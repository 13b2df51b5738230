//! Continuous capture sessions (Toggle and Hold)
//!
//! Both strategies open a recognizer session on `start` and close it on `stop`.
//! A pump task folds recognition events into the transcript while the session
//! is open; what differs between the two is the `Transcript` policy.

use crate::capture::{
    AccumulatingTranscript, CaptureError, CaptureKind, CaptureObserver, CaptureProgress,
    CaptureStrategy, HoldTranscript, RecognitionEvent, SpeechRecognizer, Transcript,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub type ToggleCapture = ContinuousCapture<AccumulatingTranscript>;
pub type HoldCapture = ContinuousCapture<HoldTranscript>;

struct OpenSession<T> {
    transcript: Arc<Mutex<T>>,
    stop_tx: Option<oneshot::Sender<()>>,
    pump: Option<JoinHandle<()>>,
}

impl<T> OpenSession<T> {
    /// Signal the pump to drain and exit, then wait for it
    async fn close(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
    }
}

impl<T> Drop for OpenSession<T> {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

pub struct ContinuousCapture<T: Transcript> {
    recognizer: Arc<dyn SpeechRecognizer>,
    observer: Arc<dyn CaptureObserver>,
    template: T,
    session: Option<OpenSession<T>>,
}

impl<T: Transcript> ContinuousCapture<T> {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        observer: Arc<dyn CaptureObserver>,
        template: T,
    ) -> Self {
        Self {
            recognizer,
            observer,
            template,
            session: None,
        }
    }
}

#[async_trait]
impl<T: Transcript> CaptureStrategy for ContinuousCapture<T> {
    fn kind(&self) -> CaptureKind {
        T::KIND
    }

    fn is_listening(&self) -> bool {
        self.session.is_some()
    }

    async fn start(&mut self) -> Result<CaptureProgress, CaptureError> {
        if self.session.is_some() {
            return Ok(CaptureProgress::Listening);
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.recognizer.start_continuous(events_tx).await?;

        let transcript = Arc::new(Mutex::new(self.template.clone()));
        let (stop_tx, stop_rx) = oneshot::channel();
        let pump = tokio::spawn(pump_events(
            events_rx,
            stop_rx,
            Arc::clone(&transcript),
            Arc::clone(&self.observer),
        ));

        debug!("{} capture session opened", T::KIND);
        self.session = Some(OpenSession {
            transcript,
            stop_tx: Some(stop_tx),
            pump: Some(pump),
        });

        Ok(CaptureProgress::Listening)
    }

    async fn stop(&mut self) -> Result<String, CaptureError> {
        let mut session = self.session.take().ok_or_else(|| {
            CaptureError::RecognitionFailed("recognition not started".to_string())
        })?;

        let stopped = self.recognizer.stop_continuous().await;
        session.close().await;
        stopped?;

        debug!("{} capture session closed", T::KIND);
        let text = session.transcript.lock().finish();
        text.ok_or(CaptureError::NoSpeechDetected)
    }

    async fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = self.recognizer.stop_continuous().await {
                warn!("Failed to stop recognizer during teardown: {}", e);
            }
            session.close().await;
            debug!("{} capture session torn down", T::KIND);
        }
    }
}

impl<T: Transcript> Drop for ContinuousCapture<T> {
    /// Closes a session that was never stopped; the pump is aborted with it
    fn drop(&mut self) {
        if self.session.is_none() {
            return;
        }
        let recognizer = Arc::clone(&self.recognizer);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = recognizer.stop_continuous().await {
                        warn!("Failed to stop recognizer on drop: {}", e);
                    }
                });
            }
            Err(_) => warn!(
                "{} capture dropped outside a runtime, recognizer left open",
                T::KIND
            ),
        }
    }
}

async fn pump_events<T: Transcript>(
    mut events: mpsc::UnboundedReceiver<RecognitionEvent>,
    mut stop_rx: oneshot::Receiver<()>,
    transcript: Arc<Mutex<T>>,
    observer: Arc<dyn CaptureObserver>,
) {
    let handle = |event: RecognitionEvent| match event {
        RecognitionEvent::Canceled(reason) => {
            warn!("Recognition canceled: {}", reason);
            observer.on_error(&CaptureError::RecognitionFailed(reason));
        }
        RecognitionEvent::SessionStopped => debug!("Recognizer ended the session"),
        event => {
            let interim = transcript.lock().apply(event);
            if let Some(text) = interim {
                observer.on_interim(&text);
            }
        }
    };

    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => handle(event),
                None => break,
            },
            _ = &mut stop_rx => {
                while let Ok(event) = events.try_recv() {
                    handle(event);
                }
                break;
            }
        }
    }
}
