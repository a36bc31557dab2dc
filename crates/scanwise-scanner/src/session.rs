//! # Scan Session Controller
//!
//! Drives one decoder through repeated scan sessions. Each session acquires
//! a single barcode and hands it to the caller's completion callback.
//!
//! ## Guarantees
//! - At most one decoder session is live at a time
//! - The decoder is released (stopped, handler removed) exactly once per
//!   session, and before the completion callback runs
//! - Payloads shorter than eight characters never complete a session
//! - Detections arriving after release are never delivered
//!
//! ## Threading
//! All transitions take `&mut self`. Decoder callbacks only enqueue into the
//! session's channel; [`pump`](ScanSessionController::pump) and
//! [`wait`](ScanSessionController::wait) apply them here.
//!
//! ## Example
//! ```rust,no_run
//! use scanwise_scanner::{LineDecoder, RenderSurface, ScanSessionController, SessionEnd};
//!
//! # async fn run() {
//! // Any line source works; the CLI wraps stdin in a BufReader
//! let decoder = LineDecoder::new(tokio::io::empty());
//! let mut controller = ScanSessionController::new(decoder);
//!
//! controller
//!     .start(&RenderSurface::new("stdin"), |code| println!("scanned {code}"))
//!     .expect("controller is idle");
//!
//! if let SessionEnd::Completed(code) = controller.wait().await {
//!     // submit `code` for analysis
//! #   let _ = code;
//! }
//! # }
//! ```

use std::fmt;
use std::time::Instant;

use scanwise_core::validation::is_accepted_payload;
use scanwise_core::CAMERA_UNAVAILABLE_MESSAGE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::DecodeConfig;
use crate::decoder::{Decoder, DetectionEvent, RenderSurface};
use crate::error::{DecoderError, SessionError, SessionResult};
use crate::subscription::{DetectionSubscription, Poll};

// =============================================================================
// State
// =============================================================================

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session; ready to start.
    #[default]
    Idle,
    /// Decoder running, waiting for a valid detection.
    Acquiring,
    /// The last start failed; see `last_error`.
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Acquiring => write!(f, "acquiring"),
            SessionState::Error => write!(f, "error"),
        }
    }
}

/// What `on_detect` did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectOutcome {
    /// No session was acquiring.
    Ignored,
    /// Payload too short; scanning continues.
    Discarded,
    /// Session completed with this payload.
    Completed(String),
}

/// How an awaited session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Completed(String),
    /// Stopped explicitly, or the decoder's detection stream ended.
    Stopped,
    /// The controller is in the Error state.
    Failed(String),
}

/// Callback receiving the accepted payload.
pub type CompletionCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// Resources owned by an acquiring session.
struct LiveSession {
    id: Uuid,
    subscription: DetectionSubscription,
    on_complete: CompletionCallback,
    started_at: Instant,
}

// =============================================================================
// Controller
// =============================================================================

/// Owns a decoder and runs scan sessions on it.
pub struct ScanSessionController<D: Decoder> {
    decoder: D,
    config: DecodeConfig,
    state: SessionState,
    last_error: Option<String>,
    live: Option<LiveSession>,
}

impl<D: Decoder> ScanSessionController<D> {
    /// Creates an idle controller with the standard decode configuration.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            config: DecodeConfig::default(),
            state: SessionState::Idle,
            last_error: None,
            live: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Failure reason; present only in the Error state.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Id of the live session, if acquiring.
    pub fn session_id(&self) -> Option<Uuid> {
        self.live.as_ref().map(|l| l.id)
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Starts a session on `surface`.
    ///
    /// Decoder failures are not returned as errors: the decoder is released
    /// and the controller moves to [`SessionState::Error`], which is the
    /// returned state. Calling this while not Idle is rejected and leaves
    /// the current session untouched.
    pub fn start<F>(&mut self, surface: &RenderSurface, on_complete: F) -> SessionResult<SessionState>
    where
        F: FnOnce(String) + Send + 'static,
    {
        if self.state != SessionState::Idle {
            warn!(state = %self.state, "Rejected start: controller not idle");
            return Err(SessionError::NotIdle { state: self.state });
        }

        let id = Uuid::new_v4();
        debug!(session = %id, %surface, resolution = %self.config.resolution, "Initializing decoder");

        if let Err(e) = self.decoder.init(surface, &self.config) {
            self.decoder.stop();
            return Ok(self.fail(id, e));
        }

        let mut subscription = DetectionSubscription::register(&mut self.decoder);

        if let Err(e) = self.decoder.start() {
            subscription.cancel(&mut self.decoder);
            self.decoder.stop();
            return Ok(self.fail(id, e));
        }

        self.live = Some(LiveSession {
            id,
            subscription,
            on_complete: Box::new(on_complete),
            started_at: Instant::now(),
        });
        self.state = SessionState::Acquiring;
        info!(session = %id, "Scan session acquiring");

        Ok(self.state)
    }

    fn fail(&mut self, id: Uuid, error: DecoderError) -> SessionState {
        warn!(session = %id, error = %error, "Decoder unavailable");
        self.state = SessionState::Error;
        self.last_error = Some(CAMERA_UNAVAILABLE_MESSAGE.to_string());
        self.state
    }

    /// Applies one decode attempt.
    pub fn on_detect(&mut self, event: DetectionEvent) -> DetectOutcome {
        if self.state != SessionState::Acquiring {
            trace!(state = %self.state, "Detection ignored");
            return DetectOutcome::Ignored;
        }

        if !is_accepted_payload(&event.payload) {
            trace!(len = event.payload.chars().count(), "Detection discarded as noise");
            return DetectOutcome::Discarded;
        }

        let Some(live) = self.release() else {
            return DetectOutcome::Ignored;
        };
        self.state = SessionState::Idle;

        info!(
            session = %live.id,
            len = event.payload.chars().count(),
            symbology = ?event.symbology,
            elapsed_ms = live.started_at.elapsed().as_millis() as u64,
            "Barcode acquired"
        );

        (live.on_complete)(event.payload.clone());
        DetectOutcome::Completed(event.payload)
    }

    /// Ends an acquiring session without a result. No-op in any other state.
    pub fn stop(&mut self) {
        if self.state != SessionState::Acquiring {
            return;
        }
        if let Some(live) = self.release() {
            info!(session = %live.id, "Scan session stopped");
        }
        self.state = SessionState::Idle;
    }

    /// Error -> Idle. No-op in any other state.
    pub fn clear_error(&mut self) {
        if self.state == SessionState::Error {
            self.state = SessionState::Idle;
            self.last_error = None;
        }
    }

    /// Takes the live session, cancels its subscription and stops the decoder.
    fn release(&mut self) -> Option<LiveSession> {
        let mut live = self.live.take()?;
        live.subscription.cancel(&mut self.decoder);
        self.decoder.stop();
        debug!(session = %live.id, "Decoder released");
        Some(live)
    }

    /// Applies detections already delivered, without waiting.
    ///
    /// Returns the payload if one of them completed the session. An ended
    /// detection stream stops the session.
    pub fn pump(&mut self) -> Option<String> {
        while self.state == SessionState::Acquiring {
            let polled = match self.live.as_mut() {
                Some(live) => live.subscription.poll(),
                None => return None,
            };
            match polled {
                Poll::Event(event) => {
                    if let DetectOutcome::Completed(payload) = self.on_detect(event) {
                        return Some(payload);
                    }
                }
                Poll::Empty => return None,
                Poll::Closed => {
                    debug!("Detection stream ended");
                    self.stop();
                }
            }
        }
        None
    }

    /// Drives detections until the session ends.
    pub async fn wait(&mut self) -> SessionEnd {
        loop {
            match self.state {
                SessionState::Idle => return SessionEnd::Stopped,
                SessionState::Error => {
                    return SessionEnd::Failed(self.last_error.clone().unwrap_or_default())
                }
                SessionState::Acquiring => {}
            }

            let next = match self.live.as_mut() {
                Some(live) => live.subscription.next().await,
                None => return SessionEnd::Stopped,
            };

            match next {
                Some(event) => {
                    if let DetectOutcome::Completed(payload) = self.on_detect(event) {
                        return SessionEnd::Completed(payload);
                    }
                }
                None => {
                    debug!("Detection stream ended");
                    self.stop();
                    return SessionEnd::Stopped;
                }
            }
        }
    }
}

impl<D: Decoder> Drop for ScanSessionController<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<D: Decoder> fmt::Debug for ScanSessionController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSessionController")
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .field("session", &self.session_id())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DetectionHandler, HandlerId};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted decoder: counts lifecycle calls and lets the test emit events.
    #[derive(Clone, Default)]
    struct Script {
        inits: Arc<AtomicUsize>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        handlers: Arc<Mutex<HashMap<HandlerId, DetectionHandler>>>,
    }

    impl Script {
        fn emit(&self, payload: &str) {
            for handler in self.handlers.lock().unwrap().values() {
                handler(DetectionEvent::new(payload));
            }
        }

        fn stops(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }
    }

    struct ScriptedDecoder {
        script: Script,
        fail_init: Option<&'static str>,
        fail_start: bool,
        /// Keep handlers after off_detected, like a decoder with a late callback.
        sticky: bool,
        next_id: u64,
    }

    impl ScriptedDecoder {
        fn new(script: &Script) -> Self {
            Self {
                script: script.clone(),
                fail_init: None,
                fail_start: false,
                sticky: false,
                next_id: 0,
            }
        }
    }

    impl Decoder for ScriptedDecoder {
        fn init(&mut self, _: &RenderSurface, _: &DecodeConfig) -> Result<(), DecoderError> {
            self.script.inits.fetch_add(1, Ordering::SeqCst);
            match self.fail_init {
                Some(reason) => Err(DecoderError::PermissionDenied(reason.to_string())),
                None => Ok(()),
            }
        }

        fn start(&mut self) -> Result<(), DecoderError> {
            self.script.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                Err(DecoderError::Start("stream busy".into()))
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {
            self.script.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn on_detected(&mut self, handler: DetectionHandler) -> HandlerId {
            self.next_id += 1;
            let id = HandlerId(self.next_id);
            self.script.handlers.lock().unwrap().insert(id, handler);
            id
        }

        fn off_detected(&mut self, id: HandlerId) {
            if !self.sticky {
                self.script.handlers.lock().unwrap().remove(&id);
            }
        }
    }

    fn surface() -> RenderSurface {
        RenderSurface::new("reader")
    }

    fn collector() -> (Arc<Mutex<Vec<String>>>, impl FnOnce(String) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |code| sink.lock().unwrap().push(code))
    }

    #[test]
    fn test_start_moves_to_acquiring() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));

        let state = controller.start(&surface(), |_| {}).unwrap();

        assert_eq!(state, SessionState::Acquiring);
        assert!(controller.session_id().is_some());
        assert_eq!(script.inits.load(Ordering::SeqCst), 1);
        assert_eq!(script.starts.load(Ordering::SeqCst), 1);
        assert_eq!(script.stops(), 0);
    }

    #[test]
    fn test_short_payload_then_valid_payload() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        let (seen, on_complete) = collector();
        controller.start(&surface(), on_complete).unwrap();

        assert_eq!(
            controller.on_detect(DetectionEvent::new("1234567")),
            DetectOutcome::Discarded
        );
        assert_eq!(controller.state(), SessionState::Acquiring);
        assert!(seen.lock().unwrap().is_empty());

        assert_eq!(
            controller.on_detect(DetectionEvent::new("12345678")),
            DetectOutcome::Completed("12345678".into())
        );
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(*seen.lock().unwrap(), vec!["12345678".to_string()]);
        assert_eq!(script.stops(), 1);
        assert!(script.handlers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_payload_length_counts_characters() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        controller.start(&surface(), |_| {}).unwrap();

        // Seven characters, fourteen bytes
        assert_eq!(
            controller.on_detect(DetectionEvent::new("ééééééé")),
            DetectOutcome::Discarded
        );
        assert_eq!(
            controller.on_detect(DetectionEvent::new("éééééééé")),
            DetectOutcome::Completed("éééééééé".into())
        );
    }

    #[test]
    fn test_decoder_released_before_callback() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        let observed = Arc::new(AtomicUsize::new(usize::MAX));
        let (probe, stops) = (observed.clone(), script.stops.clone());

        controller
            .start(&surface(), move |_| {
                probe.store(stops.load(Ordering::SeqCst), Ordering::SeqCst)
            })
            .unwrap();
        controller.on_detect(DetectionEvent::new("4006381333931"));

        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_only_first_valid_payload_completes() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        let (seen, on_complete) = collector();
        controller.start(&surface(), on_complete).unwrap();

        controller.on_detect(DetectionEvent::new("11111111"));
        assert_eq!(
            controller.on_detect(DetectionEvent::new("22222222")),
            DetectOutcome::Ignored
        );

        assert_eq!(*seen.lock().unwrap(), vec!["11111111".to_string()]);
        assert_eq!(script.stops(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));

        // Idle: nothing to release
        controller.stop();
        assert_eq!(script.stops(), 0);

        controller.start(&surface(), |_| {}).unwrap();
        controller.stop();
        controller.stop();
        controller.stop();

        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(script.stops(), 1);
        assert!(controller.session_id().is_none());
    }

    #[test]
    fn test_init_failure_moves_to_error() {
        let script = Script::default();
        let mut decoder = ScriptedDecoder::new(&script);
        decoder.fail_init = Some("permission denied");
        let mut controller = ScanSessionController::new(decoder);
        let (seen, on_complete) = collector();

        let state = controller.start(&surface(), on_complete).unwrap();

        assert_eq!(state, SessionState::Error);
        assert_eq!(controller.last_error(), Some("Camera access denied or not available"));
        assert_eq!(script.starts.load(Ordering::SeqCst), 0);
        assert_eq!(script.stops(), 1);
        assert!(script.handlers.lock().unwrap().is_empty());

        controller.clear_error();
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller.last_error().is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_start_failure_releases_subscription() {
        let script = Script::default();
        let mut decoder = ScriptedDecoder::new(&script);
        decoder.fail_start = true;
        let mut controller = ScanSessionController::new(decoder);

        assert_eq!(controller.start(&surface(), |_| {}).unwrap(), SessionState::Error);
        assert!(script.handlers.lock().unwrap().is_empty());
        assert_eq!(script.stops(), 1);
    }

    #[test]
    fn test_clear_error_noop_outside_error() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        controller.clear_error();
        assert_eq!(controller.state(), SessionState::Idle);

        controller.start(&surface(), |_| {}).unwrap();
        controller.clear_error();
        assert_eq!(controller.state(), SessionState::Acquiring);
    }

    #[test]
    fn test_reentrant_start_rejected() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        let (seen, on_complete) = collector();
        controller.start(&surface(), on_complete).unwrap();
        let first = controller.session_id();

        let err = controller.start(&surface(), |_| panic!("replaced callback ran")).unwrap_err();

        assert_eq!(
            err,
            SessionError::NotIdle {
                state: SessionState::Acquiring
            }
        );
        assert_eq!(controller.session_id(), first);
        assert_eq!(script.inits.load(Ordering::SeqCst), 1);

        controller.on_detect(DetectionEvent::new("12345678"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_start_rejected_in_error_until_cleared() {
        let script = Script::default();
        let mut decoder = ScriptedDecoder::new(&script);
        decoder.fail_init = Some("no camera");
        let mut controller = ScanSessionController::new(decoder);
        controller.start(&surface(), |_| {}).unwrap();

        assert!(controller.start(&surface(), |_| {}).is_err());
        controller.clear_error();
        // Still failing, but the attempt is made
        assert_eq!(controller.start(&surface(), |_| {}).unwrap(), SessionState::Error);
        assert_eq!(script.inits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_releases_once() {
        let script = Script::default();
        {
            let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
            controller.start(&surface(), |_| {}).unwrap();
        }
        assert_eq!(script.stops(), 1);

        {
            let _idle = ScanSessionController::new(ScriptedDecoder::new(&script));
        }
        assert_eq!(script.stops(), 1);
    }

    #[test]
    fn test_pump_applies_emitted_events() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        let (seen, on_complete) = collector();
        controller.start(&surface(), on_complete).unwrap();

        assert_eq!(controller.pump(), None);
        script.emit("123");
        script.emit("96385074");
        script.emit("4006381333931");

        assert_eq!(controller.pump(), Some("96385074".to_string()));
        assert_eq!(*seen.lock().unwrap(), vec!["96385074".to_string()]);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_late_detection_after_stop_is_dropped() {
        let script = Script::default();
        let mut decoder = ScriptedDecoder::new(&script);
        decoder.sticky = true;
        let mut controller = ScanSessionController::new(decoder);
        let (seen, on_complete) = collector();
        controller.start(&surface(), on_complete).unwrap();
        controller.stop();

        // Handler still registered on the decoder; its channel is closed
        script.emit("12345678");
        assert_eq!(controller.pump(), None);

        // A fresh session does not see the stale event either
        let (fresh, on_complete) = collector();
        controller.start(&surface(), on_complete).unwrap();
        assert_eq!(controller.pump(), None);
        assert_eq!(controller.state(), SessionState::Acquiring);

        assert!(seen.lock().unwrap().is_empty());
        assert!(fresh.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wait_completes_on_detection() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        controller.start(&surface(), |_| {}).unwrap();

        let emitter = script.clone();
        tokio::spawn(async move {
            emitter.emit("short");
            emitter.emit("ABCD-1234");
        });

        assert_eq!(controller.wait().await, SessionEnd::Completed("ABCD-1234".into()));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_wait_stops_when_stream_ends() {
        let script = Script::default();
        let mut controller = ScanSessionController::new(ScriptedDecoder::new(&script));
        controller.start(&surface(), |_| {}).unwrap();

        // Decoder drops every handler, closing the channel
        script.handlers.lock().unwrap().clear();

        assert_eq!(controller.wait().await, SessionEnd::Stopped);
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(script.stops(), 1);
    }

    #[tokio::test]
    async fn test_wait_reports_error_state() {
        let script = Script::default();
        let mut decoder = ScriptedDecoder::new(&script);
        decoder.fail_init = Some("permission denied");
        let mut controller = ScanSessionController::new(decoder);
        controller.start(&surface(), |_| {}).unwrap();

        assert_eq!(
            controller.wait().await,
            SessionEnd::Failed(CAMERA_UNAVAILABLE_MESSAGE.to_string())
        );
    }
}
