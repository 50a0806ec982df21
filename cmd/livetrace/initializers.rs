use std::{fs, io::IsTerminal};

use bytes::Bytes;
use eyre::WrapErr;
use livetrace::{
    ExecutionContext, LiveTracerRegistry, install_global_registry, new_live_tracer_from_global,
    set_ctx_live_tracer,
};
use livetrace_blockchain::Blockchain;
use livetrace_common::types::{
    Block, BlockBody, BlockHeader, ChainConfig, StorageWrite, TX_BASE_GAS, Transaction, TxKind,
};
use livetrace_common::{Address, H256, U256};
use livetrace_vm::{Account, StateDb};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, Layer, Registry, filter::Directive, fmt, layer::SubscriberExt};

use crate::{
    cli::{LogColor, Options},
    tracers,
};

const DEMO_GAS_LIMIT: u64 = 30_000_000;
const DEMO_SENDER_BALANCE: u64 = 1_000_000_000;

pub fn init_tracing(opts: &Options) -> eyre::Result<()> {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();

    let use_color = match opts.log_color {
        LogColor::Always => true,
        LogColor::Never => false,
        LogColor::Auto => std::io::stdout().is_terminal(),
    };

    let include_target = matches!(opts.log_level, Level::DEBUG | Level::TRACE);

    let fmt_layer = fmt::layer()
        .with_target(include_target)
        .with_ansi(use_color);

    let subscriber = Registry::default().with(fmt_layer.with_filter(log_filter));

    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("setting default subscriber failed")
}

/// Registry holding every tracer compiled into this binary.
pub fn init_tracer_registry() -> LiveTracerRegistry {
    let mut registry = LiveTracerRegistry::new();
    tracers::register_builtin_tracers(&mut registry);
    registry
}

pub fn load_chain_config(opts: &Options) -> eyre::Result<ChainConfig> {
    let Some(path) = &opts.chain_config else {
        return Ok(ChainConfig::default());
    };
    let contents = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read chain config {}", path.display()))?;
    let chain_config: ChainConfig = serde_json::from_str(&contents)
        .wrap_err_with(|| format!("Failed to parse chain config {}", path.display()))?;
    info!(chain_id = chain_config.chain_id, path = %path.display(), "Loaded chain config");
    Ok(chain_config)
}

/// Installs the tracer registry and, when a tracer is configured, returns a
/// context carrying it. Without one the returned context is empty and block
/// execution is not traced.
pub fn init_live_tracer(
    opts: &Options,
    chain_config: &ChainConfig,
) -> eyre::Result<ExecutionContext> {
    install_global_registry(init_tracer_registry())?;

    let ctx = ExecutionContext::new();
    let Some(tracer) = &opts.live_evm_tracer else {
        info!("Live tracing disabled");
        return Ok(ctx);
    };

    let hooks = new_live_tracer_from_global(tracer, chain_config)
        .wrap_err("Failed to initialize live tracer")?;
    Ok(set_ctx_live_tracer(&ctx, hooks))
}

/// A chain with one funded sender and `count` blocks on top of genesis. The
/// first block deploys a contract, every block sends value to it and writes
/// one of its storage slots.
pub fn build_demo_chain(chain_config: ChainConfig, count: u64) -> (Blockchain, Vec<Block>) {
    let sender = Address::from_low_u64_be(0xa11ce);
    let state = StateDb::with_accounts([(
        sender,
        Account::new(U256::from(DEMO_SENDER_BALANCE), Bytes::new(), 0),
    )]);

    let genesis = BlockHeader {
        gas_limit: DEMO_GAS_LIMIT,
        extra_data: Bytes::from_static(b"livetrace genesis"),
        ..Default::default()
    };
    let blockchain = Blockchain::new(chain_config, &genesis, state);

    let deploy = Transaction {
        nonce: 0,
        from: sender,
        to: TxKind::Create,
        gas_limit: 100_000,
        // PUSH1 0x00 PUSH1 0x00 RETURN
        data: Bytes::from_static(&[0x60, 0x00, 0x60, 0x00, 0xf3]),
        ..Default::default()
    };
    let contract = deploy.create_address();

    let mut blocks = Vec::new();
    let mut parent = genesis;
    let mut nonce = 0;
    for number in 1..=count {
        let mut transactions = Vec::new();
        if number == 1 {
            transactions.push(deploy.clone());
            nonce += 1;
        }
        transactions.push(Transaction {
            nonce,
            from: sender,
            to: TxKind::Call(contract),
            value: U256::from(number),
            gas_limit: TX_BASE_GAS,
            storage_writes: vec![StorageWrite {
                slot: H256::from_low_u64_be(number % 2),
                value: H256::from_low_u64_be(number),
            }],
            ..Default::default()
        });
        nonce += 1;

        let header = BlockHeader {
            parent_hash: parent.hash(),
            number,
            gas_limit: DEMO_GAS_LIMIT,
            gas_used: TX_BASE_GAS * transactions.len() as u64,
            timestamp: parent.timestamp + 12,
            ..Default::default()
        };
        blocks.push(Block::new(header.clone(), BlockBody { transactions }));
        parent = header;
    }

    (blockchain, blocks)
}
