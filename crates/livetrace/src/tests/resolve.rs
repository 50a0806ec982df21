use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use livetrace_common::types::{BlockHeader, ChainConfig, Log, Receipt, Transaction};
use livetrace_common::{Address, H256, U256};
use livetrace_vm::tracing::{EnterEvent, ExitEvent, OpcodeEvent};
use livetrace_vm::{BalanceChangeReason, CallType, GasChangeReason};

use super::helpers::{RelayUnreachable, recorder, registry_with};
use crate::{
    ExecutionContext, Hooks, LiveTracerRegistry, TracerError, TracerIdentifier,
    get_ctx_live_tracer, new_live_tracer, new_live_tracer_from_global, set_ctx_live_tracer,
};

fn sepolia() -> ChainConfig {
    ChainConfig {
        chain_id: 11_155_111,
        ..Default::default()
    }
}

#[test]
fn unknown_tracer_calls_no_factory() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut registry = LiveTracerRegistry::new();
    registry.register("firehose", move |_: &TracerIdentifier| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Hooks::default())
    });

    let err = new_live_tracer(&registry, "unregistered", &ChainConfig::default())
        .expect_err("selector is not registered");

    assert!(matches!(err, TracerError::UnknownTracer { ref selector } if selector == "unregistered"));
    assert_eq!(err.to_string(), r#"Tracer "unregistered" is not registered"#);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_scheme_reports_the_scheme() {
    let registry = registry_with(&recorder());
    let err = new_live_tracer(&registry, "firehose://localhost:8080", &ChainConfig::default())
        .expect_err("firehose is not registered");
    assert!(matches!(err, TracerError::UnknownTracer { ref selector } if selector == "firehose"));
}

#[test]
fn init_runs_once_with_the_chain_config() {
    let recorder = recorder();
    let registry = registry_with(&recorder);

    let hooks = new_live_tracer(&registry, "recording://relay?buffer=16", &sepolia())
        .expect("tracer resolves");

    let recorded = recorder.lock().expect("poisoned");
    assert_eq!(recorded.identifiers, vec!["recording://relay?buffer=16"]);
    assert_eq!(recorded.init_configs, vec![sepolia()]);
    assert!(recorded.events.is_empty());
    assert!(hooks.on_chain_block_start.is_some());
}

#[test]
fn bare_and_url_forms_select_the_same_tracer() {
    let recorder = recorder();
    let registry = registry_with(&recorder);

    new_live_tracer(&registry, "recording", &ChainConfig::default()).expect("bare form");
    new_live_tracer(&registry, "recording://", &ChainConfig::default()).expect("url form");

    let recorded = recorder.lock().expect("poisoned");
    assert_eq!(recorded.identifiers, vec!["recording", "recording://"]);
    assert_eq!(recorded.init_configs.len(), 2);
}

#[test]
fn factory_error_is_kept_as_source() {
    let registry = registry_with(&recorder());

    let err = new_live_tracer(&registry, "broken://relay", &ChainConfig::default())
        .expect_err("factory fails");

    assert!(
        matches!(err, TracerError::TracerConstructionFailed { ref selector, .. } if selector == "broken")
    );
    let source = err.source().expect("factory error kept");
    assert!(source.downcast_ref::<RelayUnreachable>().is_some());
    assert_eq!(
        err.to_string(),
        r#"Failed to create tracer "broken": relay unreachable"#
    );
}

#[test]
fn empty_identifier_fails() {
    let registry = registry_with(&recorder());
    for raw in ["", "?level=debug", "//relay"] {
        let err = new_live_tracer(&registry, raw, &ChainConfig::default())
            .expect_err("no selector");
        assert!(
            matches!(
                err,
                TracerError::MissingSelector { .. } | TracerError::InvalidIdentifier { .. }
            ),
            "{raw:?}: {err}"
        );
    }
}

#[test]
fn malformed_identifier_fails_before_lookup() {
    let registry = registry_with(&recorder());
    let err = new_live_tracer(&registry, "noop://[::1", &ChainConfig::default())
        .expect_err("malformed url");
    assert!(matches!(err, TracerError::InvalidIdentifier { .. }));
}

#[test]
fn noop_tracer_dispatch_is_a_no_op() {
    let registry = registry_with(&recorder());
    let hooks = new_live_tracer(&registry, "noop://x", &ChainConfig::default())
        .expect("noop resolves");
    let identifier = TracerIdentifier::parse("noop://x").expect("valid identifier");
    assert_eq!(identifier.selector(), "noop");

    let header = BlockHeader::default();
    let err = std::fmt::Error;
    let address = Address::from_low_u64_be(1);
    let opcode = OpcodeEvent {
        pc: 0,
        opcode: 0x00,
        gas: 21_000,
        cost: 0,
        depth: 1,
        return_data: &[],
        error: None,
    };

    hooks.chain_init(&ChainConfig::default());
    hooks.chain_block_start(header.hash(), 0, &header);
    hooks.blockchain_init(&ChainConfig::default());
    hooks.block_start(&header);
    hooks.tx_start(&Transaction::default());
    hooks.enter(&EnterEvent {
        depth: 1,
        call_type: CallType::Call,
        from: address,
        to: address,
        input: &[],
        gas: 21_000,
        value: U256::zero(),
    });
    hooks.opcode(&opcode);
    hooks.fault(&opcode);
    hooks.gas_change(21_000, 0, GasChangeReason::TxIntrinsicGas);
    hooks.balance_change(address, U256::zero(), U256::one(), BalanceChangeReason::Transfer);
    hooks.nonce_change(address, 0, 1);
    hooks.code_change(address, H256::zero(), &[], H256::zero(), &[]);
    hooks.storage_change(address, H256::zero(), H256::zero(), H256::zero());
    hooks.log(&Log::default());
    hooks.exit(&ExitEvent {
        depth: 1,
        output: &[],
        gas_used: 21_000,
        error: Some(&err),
        reverted: true,
    });
    hooks.tx_end(Some(&Receipt::default()), None);
    hooks.block_end(None);
    hooks.chain_block_end(Some(&err));
    hooks.close();
}

#[test]
fn resolved_tracer_reaches_the_engine_through_the_context() {
    let recorder = recorder();
    let registry = registry_with(&recorder);
    let hooks = new_live_tracer(&registry, "recording", &ChainConfig::default())
        .expect("tracer resolves");

    let ctx = set_ctx_live_tracer(&ExecutionContext::new(), hooks.clone());
    let found = get_ctx_live_tracer(&ctx).expect("tracer bound");
    assert!(Arc::ptr_eq(&found, &hooks));

    let header = BlockHeader {
        number: 7,
        ..Default::default()
    };
    found.chain_block_start(header.hash(), 0, &header);
    found.tx_start(&Transaction::default());
    found.chain_block_end(None);

    assert_eq!(
        recorder.lock().expect("poisoned").events,
        vec!["block_start 7", "tx_start", "block_end"]
    );
}

#[test]
fn resolving_from_global_requires_an_installed_registry() {
    // The global registry is only installed by the integration tests, which
    // run in their own process.
    let err = new_live_tracer_from_global("noop", &ChainConfig::default())
        .expect_err("no registry installed");
    assert!(matches!(err, TracerError::RegistryNotInstalled));
}
