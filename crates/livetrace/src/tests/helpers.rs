use std::error::Error;
use std::sync::{Arc, Mutex};

use livetrace_common::types::{BlockHeader, ChainConfig, Transaction};
use livetrace_vm::EvmHooks;

use crate::{BoxError, Hooks, LiveTracerRegistry, TracerIdentifier};

/// Everything a [`recording_tracer`] observed.
#[derive(Debug, Default)]
pub struct Recorded {
    pub identifiers: Vec<String>,
    pub init_configs: Vec<ChainConfig>,
    pub events: Vec<String>,
}

pub type Recorder = Arc<Mutex<Recorded>>;

pub fn recorder() -> Recorder {
    Arc::new(Mutex::new(Recorded::default()))
}

fn record(recorder: &Recorder, f: impl FnOnce(&mut Recorded)) {
    if let Ok(mut recorded) = recorder.lock() {
        f(&mut recorded);
    }
}

/// A factory whose bundle records init, block and tx events into `recorder`.
pub fn recording_tracer(
    recorder: Recorder,
) -> impl Fn(&TracerIdentifier) -> Result<Hooks, BoxError> + Send + Sync + 'static {
    move |identifier: &TracerIdentifier| {
        record(&recorder, |r| r.identifiers.push(identifier.raw().to_owned()));

        let init = recorder.clone();
        let start = recorder.clone();
        let end = recorder.clone();
        let tx = recorder.clone();
        Ok(Hooks {
            evm: Arc::new(EvmHooks {
                on_tx_start: Some(Arc::new(move |_: &Transaction| {
                    record(&tx, |r| r.events.push("tx_start".to_owned()))
                })),
                ..Default::default()
            }),
            on_chain_init: Some(Arc::new(move |config: &ChainConfig| {
                record(&init, |r| r.init_configs.push(*config))
            })),
            on_chain_block_start: Some(Arc::new(move |_, _, header: &BlockHeader| {
                record(&start, |r| r.events.push(format!("block_start {}", header.number)))
            })),
            on_chain_block_end: Some(Arc::new(move |err: Option<&(dyn Error + 'static)>| {
                let event = match err {
                    Some(err) => format!("block_end {err}"),
                    None => "block_end".to_owned(),
                };
                record(&end, |r| r.events.push(event))
            })),
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("relay unreachable")]
pub struct RelayUnreachable;

pub fn failing_tracer(_: &TracerIdentifier) -> Result<Hooks, BoxError> {
    Err(Box::new(RelayUnreachable))
}

pub fn noop_tracer(_: &TracerIdentifier) -> Result<Hooks, BoxError> {
    Ok(Hooks::default())
}

pub fn registry_with(recorder: &Recorder) -> LiveTracerRegistry {
    let mut registry = LiveTracerRegistry::new();
    registry.register("noop", noop_tracer);
    registry.register("recording", recording_tracer(recorder.clone()));
    registry.register("broken", failing_tracer);
    registry
}
