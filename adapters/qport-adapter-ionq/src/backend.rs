//! IonQ backend implementation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use qport_compile::{
    DecomposeBoxes, FlattenRegisters, GateSetPredicate, MaxNQubits, NoClassicalControl,
    NoFastFeedforward, NoMidMeasure, NoSymbols, PassManager, PostprocessCircuit, Predicate,
    RenameQubits, SimplifyInitial, SquashCustom, full_peephole_optimise, prepare_circuit,
    synthesise,
};
use qport_hal::{
    Backend, BackendInfo, BackendResult, CircuitStatus, Counts, ExtensionConfig, HalError,
    HalResult, HandleItem, HandleKind, NODE_REGISTER, Outcome, ResultCache, ResultHandle,
    StatusEnum, expand_shots,
};
use qport_ir::{Circuit, StandardGate};

use crate::api::{IONQ_JOBS_URL, IonQClient, JobRequest, JobResponse};
use crate::config::{API_KEY_ENV, IonQConfig};
use crate::convert::{IONQ_GATES, IONQ_SINGLEQS, ionq_pass, tk_to_ionq};
use crate::error::{IonQError, IonQResult};

/// Qubits on every IonQ device.
pub const IONQ_N_QUBITS: u32 = 11;

/// Job id prefix of handles issued in debug mode.
pub const DEBUG_HANDLE_PREFIX: &str = "_MACHINE_DEBUG_";

/// Name reported in [`BackendInfo`].
pub const BACKEND_NAME: &str = "IonQBackend";

/// Job id, shots, measure permutation JSON, postprocessing JSON.
const RESULT_ID_TYPE: [HandleKind; 4] = [
    HandleKind::Str,
    HandleKind::Int,
    HandleKind::Str,
    HandleKind::Str,
];

fn ionq_info(device_name: &str) -> BackendInfo {
    BackendInfo::fully_connected(
        BACKEND_NAME,
        device_name,
        env!("CARGO_PKG_VERSION"),
        IONQ_N_QUBITS,
        IONQ_GATES,
    )
}

fn status_from_ionq(status: &str) -> CircuitStatus {
    match status {
        "completed" => CircuitStatus::new(StatusEnum::Completed),
        "failed" => CircuitStatus::new(StatusEnum::Error),
        "ready" => CircuitStatus::new(StatusEnum::Submitted),
        "running" => CircuitStatus::new(StatusEnum::Running),
        "canceled" => CircuitStatus::new(StatusEnum::Cancelled),
        other => CircuitStatus::with_message(StatusEnum::Error, other),
    }
}

/// Rebuild shot counts from IonQ's outcome probabilities.
///
/// Keys are integers over `width` qubits, qubit 0 in the lowest bit. Each
/// outcome is reordered by `permutation` and gets `round(n_shots * p)`
/// shots; the rounding remainder goes to the most frequent outcome.
pub(crate) fn counts_from_histogram(
    histogram: &BTreeMap<String, f64>,
    width: usize,
    permutation: &[usize],
    n_shots: u64,
) -> IonQResult<Counts> {
    let mut counts = Counts::new();
    for (key, probability) in histogram {
        let value: u64 = key
            .trim()
            .parse()
            .map_err(|_| IonQError::InvalidResponse(format!("histogram key '{key}'")))?;
        let outcome = Outcome::from_int(value, width, false).choose_indices(permutation);
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let shots = (n_shots as f64 * probability).round().max(0.0) as u64;
        counts.insert(outcome, shots);
    }

    let total = counts.total();
    let Some(top) = counts.most_frequent().map(|(o, _)| o.clone()) else {
        return Ok(counts);
    };
    Ok(counts
        .iter()
        .map(|(o, c)| {
            let c = if *o == top {
                (c + n_shots).saturating_sub(total)
            } else {
                c
            };
            (o.clone(), c)
        })
        .collect())
}

/// Interface to an IonQ device.
///
/// Handles are persistent: their string form can be parsed back in another
/// process and polled with a new backend instance.
#[derive(Debug)]
pub struct IonQBackend {
    client: IonQClient,
    info: BackendInfo,
    label: String,
    cache: ResultCache,
    machine_debug: bool,
}

impl IonQBackend {
    /// Create a backend for `device_name` (`"qpu"` or `"simulator"`).
    ///
    /// The key is `api_key`, else the one in the config file, else
    /// `IONQ_API_KEY`.
    pub fn new(device_name: &str, api_key: Option<String>, label: &str) -> IonQResult<Self> {
        let config = IonQConfig::from_default_config_file()
            .map_err(|e| IonQError::Config(e.to_string()))?;
        let key = config.resolve_api_key(api_key, std::env::var(API_KEY_ENV).ok())?;
        Ok(Self::with_client(IonQClient::new(key)?, device_name, label))
    }

    /// Create a backend around an existing client.
    pub fn with_client(client: IonQClient, device_name: &str, label: &str) -> Self {
        Self {
            client,
            info: ionq_info(device_name),
            label: label.to_string(),
            cache: ResultCache::default(),
            machine_debug: false,
        }
    }

    /// Backend in debug mode that needs no key and never contacts IonQ.
    pub fn offline(device_name: &str, label: &str) -> IonQResult<Self> {
        let client = IonQClient::with_base_url(IONQ_JOBS_URL, "")?;
        Ok(Self::with_client(client, device_name, label).with_machine_debug(true))
    }

    /// Check whether a handle was issued in debug mode.
    pub fn is_debug_handle(handle: &ResultHandle) -> bool {
        handle
            .str_at(0)
            .is_some_and(|id| id.starts_with(DEBUG_HANDLE_PREFIX))
    }

    /// In debug mode nothing is sent and every job completes with all-zero
    /// readouts.
    #[must_use]
    pub fn with_machine_debug(mut self, enabled: bool) -> Self {
        self.machine_debug = enabled;
        self
    }

    /// Devices this backend can target.
    pub fn available_devices() -> Vec<BackendInfo> {
        vec![ionq_info("qpu")]
    }

    /// Target device name.
    pub fn device_name(&self) -> &str {
        self.info.device_name.as_deref().unwrap_or("qpu")
    }

    fn rename_to_nodes(&self) -> RenameQubits {
        RenameQubits::to_register(NODE_REGISTER, self.info.n_nodes())
    }

    fn job_name(&self, circuit: &Circuit, index: usize) -> String {
        if circuit.name().is_empty() {
            format!("{}_{index}", self.label)
        } else {
            circuit.name().to_string()
        }
    }

    async fn submit(&self, request: &JobRequest) -> HalResult<String> {
        let resp = match self.client.submit_job(request).await {
            Ok(resp) => resp,
            Err(IonQError::Connection(e)) => {
                warn!("connection failure during submit: {e}");
                return Err(HalError::SubmissionFailed(format!(
                    "{} Connection Error: Error during submit...",
                    self.label
                )));
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(error) = resp.error_message() {
            return Err(HalError::SubmissionFailed(error));
        }
        if resp.is_failed() {
            return Err(HalError::SubmissionFailed(
                "Unknown error while submitting job.".into(),
            ));
        }
        resp.id
            .ok_or_else(|| IonQError::InvalidResponse("submission returned no job id".into()).into())
    }

    fn parse_handle(handle: &ResultHandle) -> HalResult<(&str, u64)> {
        let job_id = handle
            .str_at(0)
            .ok_or_else(|| HalError::InvalidHandle(handle.to_string()))?;
        let n_shots = handle
            .int_at(1)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| HalError::InvalidHandle(handle.to_string()))?;
        Ok((job_id, n_shots))
    }

    async fn debug_status(&self, handle: &ResultHandle, job_id: &str, n_shots: u64) -> HalResult<CircuitStatus> {
        let n_qubits: usize = job_id
            .strip_prefix(DEBUG_HANDLE_PREFIX)
            .and_then(|n| n.parse().ok())
            .filter(|&n| n <= IONQ_N_QUBITS as usize)
            .ok_or_else(|| HalError::InvalidHandle(handle.to_string()))?;
        let counts: Counts = [(Outcome::zeros(n_qubits), n_shots)].into_iter().collect();
        self.cache
            .set_result(handle, BackendResult::from_counts(counts))
            .await;
        Ok(CircuitStatus::new(StatusEnum::Completed))
    }

    fn completed_result(
        handle: &ResultHandle,
        resp: &JobResponse,
        n_shots: u64,
    ) -> HalResult<BackendResult> {
        let permutation: Vec<usize> = serde_json::from_str(handle.str_at(2).unwrap_or("[]"))?;
        let ppcirc: Option<PostprocessCircuit> =
            serde_json::from_str(handle.str_at(3).unwrap_or("null"))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = resp
            .qubits
            .as_ref()
            .and_then(|q| q.as_f64())
            .ok_or_else(|| IonQError::InvalidResponse("completed job without 'qubits'".into()))?
            as usize;
        let histogram: BTreeMap<String, f64> = resp
            .data
            .as_ref()
            .ok_or_else(|| IonQError::InvalidResponse("completed job without 'data'".into()))?
            .histogram
            .iter()
            .map(|(key, p)| {
                p.as_f64()
                    .map(|p| (key.clone(), p))
                    .ok_or_else(|| IonQError::InvalidResponse(format!("probability of '{key}'")))
            })
            .collect::<IonQResult<_>>()?;

        let counts = counts_from_histogram(&histogram, width, &permutation, n_shots)?;
        Ok(BackendResult::from_counts(counts).with_ppcirc(ppcirc))
    }
}

#[async_trait]
impl Backend for IonQBackend {
    fn backend_info(&self) -> Option<&BackendInfo> {
        Some(&self.info)
    }

    fn required_predicates(&self) -> Vec<Box<dyn Predicate>> {
        vec![
            Box::new(NoClassicalControl),
            Box::new(NoFastFeedforward),
            Box::new(NoMidMeasure),
            Box::new(NoSymbols),
            Box::new(GateSetPredicate::new(IONQ_GATES)),
            Box::new(MaxNQubits(self.info.n_nodes() as usize)),
        ]
    }

    fn default_compilation_pass(&self, optimisation_level: u8) -> HalResult<PassManager> {
        let pm = PassManager::named(format!("IonQDefault{optimisation_level}")).with(DecomposeBoxes);
        let pm = match optimisation_level {
            0 => pm
                .with(FlattenRegisters)
                .with(self.rename_to_nodes())
                .with(ionq_pass()),
            1 => pm
                .with(synthesise())
                .with(FlattenRegisters)
                .with(self.rename_to_nodes())
                .with(ionq_pass())
                .with(SimplifyInitial::new(false, true)),
            2 => pm
                .with(full_peephole_optimise())
                .with(FlattenRegisters)
                .with(self.rename_to_nodes())
                .with(ionq_pass())
                .with(SquashCustom::new(IONQ_SINGLEQS, |a, b, c| {
                    vec![
                        StandardGate::Rz(c.into()),
                        StandardGate::Rx(b.into()),
                        StandardGate::Rz(a.into()),
                    ]
                }))
                .with(SimplifyInitial::new(false, true)),
            other => {
                return Err(HalError::Configuration(format!(
                    "optimisation level {other} is not one of 0, 1, 2"
                )));
            }
        };
        Ok(pm)
    }

    fn result_id_type(&self) -> &[HandleKind] {
        &RESULT_ID_TYPE
    }

    fn cache(&self) -> &ResultCache {
        &self.cache
    }

    #[instrument(skip(self, circuits, n_shots), fields(n_circuits = circuits.len(), device = %self.device_name()))]
    async fn process_circuits(
        &self,
        circuits: &[Circuit],
        n_shots: &[u32],
        valid_check: bool,
        postprocess: bool,
    ) -> HalResult<Vec<ResultHandle>> {
        let shots = expand_shots(circuits.len(), n_shots)?;
        if valid_check {
            self.check_all_circuits(circuits)?;
        }

        let mut handles = Vec::with_capacity(circuits.len());
        for (i, (circuit, &n)) in circuits.iter().zip(&shots).enumerate() {
            let (to_run, ppcirc) = if postprocess {
                let (c0, pp) = prepare_circuit(circuit, false)?;
                (c0, Some(pp))
            } else {
                (circuit.clone(), None)
            };
            let (body, measures) = tk_to_ionq(&to_run)?;
            let no_measures = measures.is_empty();
            let measures_json = serde_json::to_string(&measures)?;
            let ppcirc_json = serde_json::to_string(&ppcirc)?;

            let job_id = if self.machine_debug {
                format!("{DEBUG_HANDLE_PREFIX}{}", circuit.num_qubits())
            } else {
                let request =
                    JobRequest::new(body, self.device_name(), self.job_name(circuit, i), n);
                self.submit(&request).await?
            };
            info!(job_id = %job_id, shots = n, "submitted circuit {i}");

            let handle = ResultHandle::new([
                HandleItem::from(job_id),
                HandleItem::Int(i64::from(n)),
                HandleItem::from(measures_json),
                HandleItem::from(ppcirc_json),
            ]);
            self.cache.insert(handle.clone()).await;
            if no_measures {
                self.cache
                    .set_result(&handle, self.empty_result(circuit, n))
                    .await;
            }
            handles.push(handle);
        }
        Ok(handles)
    }

    #[instrument(skip(self, handle), fields(handle = %handle))]
    async fn circuit_status(&self, handle: &ResultHandle) -> HalResult<CircuitStatus> {
        self.check_handle(handle)?;
        let (job_id, n_shots) = Self::parse_handle(handle)?;
        if self.machine_debug {
            return self.debug_status(handle, job_id, n_shots).await;
        }

        let resp = self.client.get_job(job_id).await.map_err(HalError::from)?;
        let status = match (&resp.status, resp.error_message()) {
            (Some(status), error) => {
                let mut status = status_from_ionq(status);
                if status.message.is_empty() {
                    status.message = error.unwrap_or_default();
                }
                status
            }
            (None, Some(error)) => CircuitStatus::with_message(StatusEnum::Error, error),
            (None, None) => {
                return Err(IonQError::InvalidResponse("job without a status".into()).into());
            }
        };
        debug!(status = %status, "IonQ job status");

        if status.status == StatusEnum::Completed {
            let result = Self::completed_result(handle, &resp, n_shots)?;
            self.cache.set_result(handle, result).await;
        }
        self.cache.set_status(handle, status.clone()).await;
        Ok(status)
    }

    #[instrument(skip(self, handle), fields(handle = %handle))]
    async fn cancel(&self, handle: &ResultHandle) -> HalResult<()> {
        if self.machine_debug {
            return Ok(());
        }
        self.check_handle(handle)?;
        let (job_id, _) = Self::parse_handle(handle)?;
        let resp = self.client.cancel_job(job_id).await.map_err(HalError::from)?;
        if let Some(error) = resp.error_message() {
            return Err(HalError::Backend(error));
        }
        if resp.is_failed() {
            return Err(HalError::Backend(
                "Unknown error while cancelling job.".into(),
            ));
        }
        info!(job_id, "cancelled");
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
