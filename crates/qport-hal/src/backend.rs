//! Backend trait definition.
//!
//! A backend compiles circuits for its device, submits them, and hands out
//! [`ResultHandle`]s that can be polled later, possibly by another process.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

use qport_compile::{Pass, PassManager, Predicate};
use qport_ir::Circuit;

use crate::cache::{CacheEntry, ResultCache};
use crate::error::{HalError, HalResult};
use crate::handle::{HandleKind, ResultHandle};
use crate::info::BackendInfo;
use crate::result::{BackendResult, Counts, Outcome};
use crate::status::{CircuitStatus, StatusEnum};

/// Interval between status polls when none is given.
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_secs(1);

/// Shot count per circuit from a single value or one value per circuit.
pub fn expand_shots(n_circuits: usize, n_shots: &[u32]) -> HalResult<Vec<u32>> {
    let shots = match n_shots {
        [single] => vec![*single; n_circuits],
        many if many.len() == n_circuits => many.to_vec(),
        many => {
            return Err(HalError::InvalidShots(format!(
                "got {} shot counts for {n_circuits} circuits",
                many.len()
            )));
        }
    };
    if let Some(i) = shots.iter().position(|&s| s == 0) {
        return Err(HalError::InvalidShots(format!(
            "circuit {i} needs at least one shot"
        )));
    }
    Ok(shots)
}

/// A device or simulator that runs circuits.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Static description, if the backend has one.
    fn backend_info(&self) -> Option<&BackendInfo>;

    /// Predicates a circuit must satisfy before submission.
    fn required_predicates(&self) -> Vec<Box<dyn Predicate>>;

    /// Compilation pass for an optimisation level.
    fn default_compilation_pass(&self, optimisation_level: u8) -> HalResult<PassManager>;

    /// Shape of the handles this backend issues.
    fn result_id_type(&self) -> &[HandleKind];

    /// Handle and result store.
    fn cache(&self) -> &ResultCache;

    /// Submit circuits, one handle per circuit.
    async fn process_circuits(
        &self,
        circuits: &[Circuit],
        n_shots: &[u32],
        valid_check: bool,
        postprocess: bool,
    ) -> HalResult<Vec<ResultHandle>>;

    /// Current status of a submitted circuit.
    async fn circuit_status(&self, handle: &ResultHandle) -> HalResult<CircuitStatus>;

    /// Cancel a submitted circuit.
    async fn cancel(&self, handle: &ResultHandle) -> HalResult<()>;

    /// Result of a circuit, waiting up to `timeout` (forever if `None`).
    async fn get_result(
        &self,
        handle: &ResultHandle,
        timeout: Option<Duration>,
        wait: Duration,
    ) -> HalResult<BackendResult>;

    /// Reject handles of the wrong shape.
    fn check_handle(&self, handle: &ResultHandle) -> HalResult<()> {
        if handle.matches(self.result_id_type()) {
            Ok(())
        } else {
            Err(HalError::InvalidHandle(format!(
                "{handle} does not match the shape {:?}",
                self.result_id_type()
            )))
        }
    }

    /// Check whether a circuit satisfies every required predicate.
    fn valid_circuit(&self, circuit: &Circuit) -> bool {
        self.required_predicates().iter().all(|p| p.verify(circuit))
    }

    /// Fail on the first circuit that breaks a predicate.
    fn check_all_circuits(&self, circuits: &[Circuit]) -> HalResult<()> {
        let predicates = self.required_predicates();
        for (index, circuit) in circuits.iter().enumerate() {
            if let Some(p) = predicates.iter().find(|p| !p.verify(circuit)) {
                return Err(HalError::CircuitNotValid {
                    index,
                    predicate: p.name(),
                });
            }
        }
        Ok(())
    }

    /// Compile a circuit in place with the default pass.
    fn compile_circuit(&self, circuit: &mut Circuit, optimisation_level: u8) -> HalResult<()> {
        let pass = self.default_compilation_pass(optimisation_level)?;
        pass.run(circuit)?;
        Ok(())
    }

    /// Compiled copy of a circuit.
    fn get_compiled_circuit(
        &self,
        circuit: &Circuit,
        optimisation_level: u8,
    ) -> HalResult<Circuit> {
        let mut compiled = circuit.clone();
        self.compile_circuit(&mut compiled, optimisation_level)?;
        Ok(compiled)
    }

    /// Result with no readout bits, one empty outcome per shot.
    fn empty_result(&self, _circuit: &Circuit, n_shots: u32) -> BackendResult {
        let counts: Counts = [(Outcome::zeros(0), u64::from(n_shots))]
            .into_iter()
            .collect();
        BackendResult::from_counts(counts)
    }

    /// Submit one circuit.
    async fn process_circuit(
        &self,
        circuit: &Circuit,
        n_shots: u32,
        valid_check: bool,
        postprocess: bool,
    ) -> HalResult<ResultHandle> {
        self.process_circuits(std::slice::from_ref(circuit), &[n_shots], valid_check, postprocess)
            .await?
            .pop()
            .ok_or_else(|| HalError::Backend("no handle returned".into()))
    }

    /// Submit one circuit and wait for its result.
    async fn run_circuit(
        &self,
        circuit: &Circuit,
        n_shots: u32,
        valid_check: bool,
        postprocess: bool,
    ) -> HalResult<BackendResult> {
        let handle = self
            .process_circuit(circuit, n_shots, valid_check, postprocess)
            .await?;
        self.get_result(&handle, None, DEFAULT_POLL_WAIT).await
    }

    /// Results for several handles, in order.
    async fn get_results(&self, handles: &[ResultHandle]) -> HalResult<Vec<BackendResult>> {
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(self.get_result(handle, None, DEFAULT_POLL_WAIT).await?);
        }
        Ok(results)
    }

    /// Poll [`Backend::circuit_status`] until the result is cached.
    #[instrument(skip(self, handle), fields(handle = %handle))]
    async fn poll_result(
        &self,
        handle: &ResultHandle,
        timeout: Option<Duration>,
        wait: Duration,
    ) -> HalResult<BackendResult> {
        self.check_handle(handle)?;
        let start = Instant::now();
        loop {
            if let Some(result) = self.cache().result(handle).await {
                return Ok(result);
            }
            let status = self.circuit_status(handle).await?;
            debug!(status = %status, "polled");
            match status.status {
                StatusEnum::Completed => {
                    return self
                        .cache()
                        .result(handle)
                        .await
                        .ok_or_else(|| HalError::CircuitNotRun(handle.to_string()));
                }
                StatusEnum::Error => return Err(HalError::JobFailed(status.message)),
                StatusEnum::Cancelled => {
                    return Err(HalError::JobFailed("Job cancelled".into()));
                }
                StatusEnum::Queued | StatusEnum::Submitted | StatusEnum::Running => {}
            }
            if let Some(limit) = timeout {
                if start.elapsed() >= limit {
                    return Err(HalError::Timeout(format!(
                        "Timed out: no results after {} seconds.",
                        limit.as_secs_f64()
                    )));
                }
            }
            sleep(wait).await;
        }
    }

    /// Remove a handle from the cache, returning what was stored.
    async fn pop_result(&self, handle: &ResultHandle) -> Option<CacheEntry> {
        self.cache().remove(handle).await
    }

    /// Forget every handle.
    async fn empty_cache(&self) {
        self.cache().clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleItem;
    use qport_compile::{MaxNQubits, NoMidMeasure};
    use qport_ir::QubitId;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Completes every job after a fixed number of polls.
    struct CountdownBackend {
        cache: ResultCache,
        polls_left: AtomicU32,
        outcome: StatusEnum,
    }

    impl CountdownBackend {
        fn new(polls: u32, outcome: StatusEnum) -> Self {
            Self {
                cache: ResultCache::default(),
                polls_left: AtomicU32::new(polls),
                outcome,
            }
        }
    }

    #[async_trait]
    impl Backend for CountdownBackend {
        fn backend_info(&self) -> Option<&BackendInfo> {
            None
        }

        fn required_predicates(&self) -> Vec<Box<dyn Predicate>> {
            vec![Box::new(MaxNQubits(2)), Box::new(NoMidMeasure)]
        }

        fn default_compilation_pass(&self, level: u8) -> HalResult<PassManager> {
            match level {
                0 => Ok(PassManager::new()),
                _ => Err(HalError::Configuration(format!("bad level {level}"))),
            }
        }

        fn result_id_type(&self) -> &[HandleKind] {
            &[HandleKind::Int]
        }

        fn cache(&self) -> &ResultCache {
            &self.cache
        }

        async fn process_circuits(
            &self,
            circuits: &[Circuit],
            n_shots: &[u32],
            valid_check: bool,
            _postprocess: bool,
        ) -> HalResult<Vec<ResultHandle>> {
            let shots = expand_shots(circuits.len(), n_shots)?;
            if valid_check {
                self.check_all_circuits(circuits)?;
            }
            let mut handles = vec![];
            for (i, n) in shots.into_iter().enumerate() {
                let handle = ResultHandle::new([HandleItem::Int(i64::from(n) * 100 + i as i64)]);
                self.cache.insert(handle.clone()).await;
                handles.push(handle);
            }
            Ok(handles)
        }

        async fn circuit_status(&self, handle: &ResultHandle) -> HalResult<CircuitStatus> {
            if self.polls_left.load(Ordering::SeqCst) > 0 {
                self.polls_left.fetch_sub(1, Ordering::SeqCst);
                return Ok(CircuitStatus::new(StatusEnum::Running));
            }
            if self.outcome == StatusEnum::Completed {
                let shots = handle.int_at(0).unwrap_or(0) as u64 / 100;
                let counts = [(Outcome::zeros(1), shots)].into_iter().collect();
                self.cache
                    .set_result(handle, BackendResult::from_counts(counts))
                    .await;
            }
            Ok(CircuitStatus::with_message(self.outcome, "device said no"))
        }

        async fn cancel(&self, _handle: &ResultHandle) -> HalResult<()> {
            Ok(())
        }

        async fn get_result(
            &self,
            handle: &ResultHandle,
            timeout: Option<Duration>,
            wait: Duration,
        ) -> HalResult<BackendResult> {
            self.poll_result(handle, timeout, wait).await
        }
    }

    fn bell() -> Circuit {
        let mut c = Circuit::with_size("bell", 2, 2);
        c.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        c.measure_all().unwrap();
        c
    }

    #[test]
    fn test_expand_shots() {
        assert_eq!(expand_shots(3, &[5]).unwrap(), vec![5, 5, 5]);
        assert_eq!(expand_shots(2, &[1, 2]).unwrap(), vec![1, 2]);
        assert!(matches!(expand_shots(2, &[1, 2, 3]), Err(HalError::InvalidShots(_))));
        assert!(matches!(expand_shots(2, &[1, 0]), Err(HalError::InvalidShots(_))));
    }

    #[test]
    fn test_check_all_circuits_reports_index() {
        let backend = CountdownBackend::new(0, StatusEnum::Completed);
        let big = Circuit::with_size("big", 3, 0);
        assert!(backend.valid_circuit(&bell()));
        assert!(!backend.valid_circuit(&big));
        let err = backend.check_all_circuits(&[bell(), big]).unwrap_err();
        match err {
            HalError::CircuitNotValid { index, predicate } => {
                assert_eq!(index, 1);
                assert!(predicate.contains("MaxNQubits"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_compile_circuit_levels() {
        let backend = CountdownBackend::new(0, StatusEnum::Completed);
        let compiled = backend.get_compiled_circuit(&bell(), 0).unwrap();
        assert_eq!(compiled.num_ops(), bell().num_ops());
        assert!(matches!(
            backend.get_compiled_circuit(&bell(), 3),
            Err(HalError::Configuration(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_circuit_polls_until_done() {
        let backend = CountdownBackend::new(3, StatusEnum::Completed);
        let result = backend.run_circuit(&bell(), 7, true, false).await.unwrap();
        assert_eq!(result.n_shots(), 7);
        let handle = ResultHandle::new([HandleItem::Int(700)]);
        assert!(backend.pop_result(&handle).await.is_some());
        assert!(backend.pop_result(&handle).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_and_timeout() {
        let backend = CountdownBackend::new(0, StatusEnum::Error);
        let handle = backend.process_circuit(&bell(), 1, false, false).await.unwrap();
        let err = backend.get_result(&handle, None, DEFAULT_POLL_WAIT).await.unwrap_err();
        assert_eq!(err.to_string(), "Job failed: device said no");

        let backend = CountdownBackend::new(u32::MAX, StatusEnum::Completed);
        let handle = backend.process_circuit(&bell(), 1, false, false).await.unwrap();
        let err = backend
            .get_result(&handle, Some(Duration::from_secs(3)), DEFAULT_POLL_WAIT)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Timed out: no results after 3 seconds.");
    }

    #[tokio::test]
    async fn test_bad_handle_shape() {
        let backend = CountdownBackend::new(0, StatusEnum::Completed);
        let handle = ResultHandle::new([HandleItem::from("nope")]);
        assert!(matches!(
            backend.get_result(&handle, None, DEFAULT_POLL_WAIT).await,
            Err(HalError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_empty_result() {
        let backend = CountdownBackend::new(0, StatusEnum::Completed);
        let result = backend.empty_result(&bell(), 4);
        assert_eq!(result.n_shots(), 4);
        assert_eq!(result.counts.len(), 1);
        assert!(result.counts.most_frequent().unwrap().0.is_empty());
    }
}
