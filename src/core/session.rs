use super::angle::PoseAngles;
use super::config::Config;
use super::exercise::{create_exercise, Exercise};
use crate::models::exercise::{
    ExerciseKind, FrameReport, SessionError, SessionResult, SessionSummary,
};
use crate::models::pose::PoseFrame;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==============================================================================
// Training Session
// ==============================================================================

const FRAME_CHANNEL_CAPACITY: usize = 100;
/// Reports beyond this many unread ones are discarded
pub const REPORT_CHANNEL_CAPACITY: usize = 1024;

/// Runs one exercise over a stream of pose frames.
///
/// Frames go through a single channel into a single worker task, so the
/// exercise sees them in submission order.
pub struct TrainingSession {
    config: Arc<RwLock<Config>>,
    current_session_id: Arc<RwLock<Option<String>>>,
    is_tracking: Arc<RwLock<bool>>,
    frame_tx: Arc<RwLock<Option<mpsc::Sender<PoseFrame>>>>,
    worker: Mutex<Option<JoinHandle<SessionSummary>>>,
}

/// Counters kept by the worker task
struct FrameStats {
    total_frames: u64,
    frames_with_pose: u64,
    frames_dropped: u64,
    reports_dropped: u64,
    last_timestamp: Option<i64>,
}

impl TrainingSession {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            current_session_id: Arc::new(RwLock::new(None)),
            is_tracking: Arc::new(RwLock::new(false)),
            frame_tx: Arc::new(RwLock::new(None)),
            worker: Mutex::new(None),
        }
    }

    /// Start counting `kind`; reports for each processed frame arrive on the returned receiver.
    ///
    /// The receiver is bounded: when it falls behind by more than
    /// `REPORT_CHANNEL_CAPACITY` reports, newer ones are dropped and counted
    /// in `SessionSummary::reports_dropped`. Counting itself is unaffected.
    pub async fn start(
        &self,
        kind: ExerciseKind,
    ) -> SessionResult<(String, mpsc::Receiver<FrameReport>)> {
        let mut is_tracking = self.is_tracking.write().await;
        if *is_tracking {
            return Err(SessionError::AlreadyRunning);
        }

        let session_id = Uuid::new_v4().to_string();
        let config = self.config.read().await.clone();

        let (tx, rx) = mpsc::channel::<PoseFrame>(FRAME_CHANNEL_CAPACITY);
        let (report_tx, report_rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);

        *self.frame_tx.write().await = Some(tx);
        *self.current_session_id.write().await = Some(session_id.clone());
        *is_tracking = true;

        let exercise = create_exercise(kind, &config);
        let worker_session_id = session_id.clone();

        let handle = tokio::spawn(async move {
            Self::process_frames(worker_session_id, exercise, config, rx, report_tx).await
        });
        *self.worker.lock().await = Some(handle);

        info!(session_id = %session_id, exercise = kind.display_name(), "Started training session");
        Ok((session_id, report_rx))
    }

    /// Queue a frame for the running session
    pub async fn submit(&self, frame: PoseFrame) -> SessionResult<()> {
        let tx = self
            .frame_tx
            .read()
            .await
            .clone()
            .ok_or(SessionError::NotRunning)?;

        tx.send(frame)
            .await
            .map_err(|_| SessionError::WorkerFailed("frame channel closed".to_string()))
    }

    /// Stop the session once every queued frame is processed
    pub async fn stop(&self) -> SessionResult<SessionSummary> {
        let mut is_tracking = self.is_tracking.write().await;
        if !*is_tracking {
            return Err(SessionError::NotRunning);
        }

        // Dropping the sender ends the worker loop after it drains the channel
        *self.frame_tx.write().await = None;

        let handle = self.worker.lock().await.take().ok_or(SessionError::NotRunning)?;
        let summary = handle
            .await
            .map_err(|e| SessionError::WorkerFailed(e.to_string()));

        *is_tracking = false;
        *self.current_session_id.write().await = None;

        let summary = summary?;
        info!(
            session_id = %summary.session_id,
            reps = summary.count,
            frames = summary.total_frames,
            "Stopped training session"
        );
        Ok(summary)
    }

    pub async fn is_running(&self) -> bool {
        *self.is_tracking.read().await
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.current_session_id.read().await.clone()
    }

    /// Replace the configuration used by the next session
    pub async fn update_config(&self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        config.validate()?;
        *self.config.write().await = config;
        Ok(())
    }

    /// Background task feeding frames to the exercise
    async fn process_frames(
        session_id: String,
        mut exercise: Box<dyn Exercise>,
        config: Config,
        mut rx: mpsc::Receiver<PoseFrame>,
        report_tx: mpsc::Sender<FrameReport>,
    ) -> SessionSummary {
        let started_at = Utc::now();
        let mut stats = FrameStats {
            total_frames: 0,
            frames_with_pose: 0,
            frames_dropped: 0,
            reports_dropped: 0,
            last_timestamp: None,
        };

        while let Some(frame) = rx.recv().await {
            stats.total_frames += 1;

            if let Some(last) = stats.last_timestamp {
                if frame.timestamp < last {
                    warn!(
                        timestamp = frame.timestamp,
                        last_timestamp = last,
                        "Dropping out-of-order pose frame"
                    );
                    stats.frames_dropped += 1;
                    continue;
                }
            }
            stats.last_timestamp = Some(frame.timestamp);

            // No body in view: nothing to measure this frame
            let pose = match &frame.body_pose {
                Some(pose) if frame.has_body() => pose,
                _ => continue,
            };
            stats.frames_with_pose += 1;

            let angles = PoseAngles::new(pose, config.frame_width, config.frame_height)
                .with_min_visibility(config.min_visibility);
            let update = exercise.update(&angles);

            if let Some(event) = &update.event {
                debug!(timestamp = frame.timestamp, label = %event.label, count = update.count, "Rep event");
            }

            let report = FrameReport {
                timestamp: frame.timestamp,
                update,
            };
            match report_tx.try_send(report) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    if stats.reports_dropped == 0 {
                        warn!("Report receiver is not keeping up, dropping frame reports");
                    }
                    stats.reports_dropped += 1;
                }
                // A closed report channel only means nobody is listening
                Err(TrySendError::Closed(_)) => {}
            }
        }

        SessionSummary {
            session_id,
            exercise: exercise.kind(),
            started_at,
            ended_at: Utc::now(),
            total_frames: stats.total_frames,
            frames_with_pose: stats.frames_with_pose,
            frames_dropped: stats.frames_dropped,
            reports_dropped: stats.reports_dropped,
            count: exercise.count(),
            side_counts: exercise.side_counts(),
        }
    }
}
