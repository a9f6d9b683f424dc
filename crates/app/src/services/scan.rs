use std::env;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db, require_active_guild};
use guild_core::ExtractionResult;
use guild_db::Db;
use scan::{OcrEngine, ReconcileOutcome, extract_activity};

#[derive(Clone)]
pub struct ScanService {
    config: SharedConfig,
    engine: Arc<dyn OcrEngine>,
    gate: Arc<Mutex<()>>,
}

impl ScanService {
    pub(super) fn new(config: SharedConfig, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            config,
            engine,
            gate: Arc::new(Mutex::new(())),
        }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    /// Runs OCR over the image and extracts typed counters. At most one
    /// scan is in flight at a time; a second request while one runs is
    /// rejected rather than queued. The engine call is bounded by the
    /// configured timeout, and a result arriving after expiry is discarded.
    pub fn scan(&self, image: Vec<u8>) -> Result<ExtractionResult> {
        let Ok(_guard) = self.gate.try_lock() else {
            return Err(AppError::ScanInFlight);
        };
        let timing_enabled = env::var("GUILD_MANAGER_SCAN_TIMING").is_ok();
        let start = Instant::now();
        let (sender, receiver) = mpsc::channel();
        let engine = self.engine.clone();
        thread::spawn(move || {
            let _ = sender.send(engine.recognize(&image));
        });
        let lines = match receiver.recv_timeout(self.config.scan_timeout) {
            Ok(Ok(lines)) => lines,
            Ok(Err(err)) => return Err(AppError::Ocr(err)),
            Err(RecvTimeoutError::Timeout) => return Err(AppError::ScanTimeout),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(AppError::Message(
                    "scan worker exited without a result".to_string(),
                ));
            }
        };
        let extraction = extract_activity(&lines);
        if timing_enabled {
            eprintln!(
                "scan: lines={} ocr+extract={}ms",
                lines.len(),
                start.elapsed().as_millis()
            );
        }
        Ok(extraction)
    }

    /// Merges an extraction into the active guild's record for `date`
    /// without persisting anything; the caller saves the returned record
    /// through the records service.
    pub fn reconcile(&self, date: &str, extraction: &ExtractionResult) -> Result<ReconcileOutcome> {
        let mut db = self.db()?;
        let guild = require_active_guild(&mut db)?;
        let roster = db.list_members(guild.id)?;
        let current = db.get_daily_record(guild.id, date)?;
        let policy = db.get_match_policy()?;
        Ok(scan::reconcile(extraction, &roster, &current, policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use guild_core::{ActivityCounters, MatchPolicy, MemberInput};
    use scan::OcrError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct FixedEngine {
        lines: Vec<String>,
    }

    impl OcrEngine for FixedEngine {
        fn recognize(&self, _image: &[u8]) -> std::result::Result<Vec<String>, OcrError> {
            Ok(self.lines.clone())
        }
    }

    struct BlockingEngine {
        started: Arc<AtomicBool>,
        release: Arc<AtomicBool>,
    }

    impl OcrEngine for BlockingEngine {
        fn recognize(&self, _image: &[u8]) -> std::result::Result<Vec<String>, OcrError> {
            self.started.store(true, Ordering::SeqCst);
            while !self.release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(Vec::new())
        }
    }

    struct FailingEngine;

    impl OcrEngine for FailingEngine {
        fn recognize(&self, _image: &[u8]) -> std::result::Result<Vec<String>, OcrError> {
            Err(OcrError::Engine("unreadable image".to_string()))
        }
    }

    fn state_with_engine(engine: Arc<dyn OcrEngine>, timeout: Duration) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let state = AppState::new(dir.path().join("test.sqlite"), timeout, engine);
        state.initialize().expect("initialize");
        (state, dir)
    }

    #[test]
    fn scan_extracts_donation_counters() {
        let engine = Arc::new(FixedEngine {
            lines: vec!["Alice 님이 기부(초급) 1회".to_string()],
        });
        let (state, _dir) = state_with_engine(engine, Duration::from_secs(1));

        let extraction = state.services.scan.scan(Vec::new()).expect("scan");
        match extraction {
            ExtractionResult::Donation { donors } => {
                assert_eq!(donors.get("Alice").map(|c| c.basic), Some(1));
            }
            other => panic!("expected donation result, got {:?}", other),
        }
    }

    #[test]
    fn second_scan_while_one_is_in_flight_is_rejected() {
        let started = Arc::new(AtomicBool::new(false));
        let release = Arc::new(AtomicBool::new(false));
        let engine = Arc::new(BlockingEngine {
            started: started.clone(),
            release: release.clone(),
        });
        let (state, _dir) = state_with_engine(engine, Duration::from_secs(5));

        let scan_service = state.services.scan.clone();
        let first = thread::spawn(move || scan_service.scan(Vec::new()));
        while !started.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }

        let second = state.services.scan.scan(Vec::new());
        assert!(matches!(second, Err(AppError::ScanInFlight)));

        release.store(true, Ordering::SeqCst);
        let outcome = first.join().expect("join first scan");
        assert!(outcome.is_ok());
    }

    #[test]
    fn slow_engine_surfaces_a_retryable_timeout() {
        let engine = Arc::new(BlockingEngine {
            started: Arc::new(AtomicBool::new(false)),
            release: Arc::new(AtomicBool::new(false)),
        });
        let (state, _dir) = state_with_engine(engine, Duration::from_millis(30));

        let outcome = state.services.scan.scan(Vec::new());
        assert!(matches!(outcome, Err(AppError::ScanTimeout)));

        let api: crate::error::ApiError = outcome.expect_err("timeout").into();
        assert_eq!(api.status, 503);
        assert_eq!(api.code.as_deref(), Some("scan_timeout"));
    }

    #[test]
    fn engine_failure_carries_the_engine_message() {
        let (state, _dir) = state_with_engine(Arc::new(FailingEngine), Duration::from_secs(1));

        let outcome = state.services.scan.scan(Vec::new());
        match outcome {
            Err(AppError::Ocr(err)) => {
                assert!(err.to_string().contains("unreadable image"));
            }
            other => panic!("expected ocr error, got {:?}", other),
        }
    }

    #[test]
    fn reconcile_uses_the_configured_match_policy() {
        let engine = Arc::new(FixedEngine { lines: Vec::new() });
        let (state, _dir) = state_with_engine(engine, Duration::from_secs(1));

        state
            .services
            .roster
            .upsert(
                None,
                &MemberInput {
                    name: "Alice".to_string(),
                    combat_power: 1_000_000,
                    role: "전사".to_string(),
                },
            )
            .expect("insert member");

        let mut donors = std::collections::BTreeMap::new();
        donors.insert(
            "alice".to_string(),
            ActivityCounters {
                basic: 1,
                ..Default::default()
            },
        );
        let extraction = ExtractionResult::Donation { donors };

        let exact = state
            .services
            .scan
            .reconcile("2025-08-06", &extraction)
            .expect("reconcile");
        assert_eq!(exact.matched, 0);

        let db = state.open_db().expect("open db");
        db.set_match_policy(MatchPolicy::Folded).expect("policy");

        let folded = state
            .services
            .scan
            .reconcile("2025-08-06", &extraction)
            .expect("reconcile folded");
        assert_eq!(folded.matched, 1);
    }
}
