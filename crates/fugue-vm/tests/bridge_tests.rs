//! Engine bridge integration tests
//!
//! Depth and read-only discipline across nested engine invocations, engine
//! selection by code format and error mapping.

mod common;

use common::{addr, env_at, ScriptedEngine};
use fugue_config::{ForkSchedule, Revision};
use fugue_primitives::{Address, BlockNumber, H256, U256};
use fugue_state::{MemoryStateDb, StateDb};
use fugue_vm::{
    CallFrame, CallKind, CallMessage, CallStatus, Capability, EngineRegistry, Evm,
    ExecutionResult, StatusCode, VmError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const GAS: u64 = 100_000;
const WITNESS: u8 = 0x20;

fn level(k: u8) -> Address {
    addr(0x10 + k)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Level { k: u8, depth: usize, is_static: bool },
    Witness { from: u8, depth: usize, is_static: bool },
}

/// Contracts 1..=5 call the next level (level 2 statically, level 5
/// fails), then call the witness once the child returned.
fn chain_engine(seen: Arc<Mutex<Vec<Seen>>>) -> ScriptedEngine {
    ScriptedEngine::new(move |host, msg, code| match code[0] {
        0x01 => {
            let k = code[1];
            seen.lock().unwrap().push(Seen::Level {
                k,
                depth: msg.depth,
                is_static: msg.is_static,
            });
            if k == 5 {
                return ExecutionResult::failure(StatusCode::InvalidInstruction);
            }

            let mut next = CallMessage::call(level(k + 1), Vec::new(), GAS, U256::zero());
            if k == 2 {
                next = next.static_call();
            }
            let outcome = host.call(next);
            let expected = if k == 4 { CallStatus::Failure } else { CallStatus::Success };
            assert_eq!(outcome.status, expected);

            host.call(CallMessage::call(addr(WITNESS), vec![k], GAS, U256::zero()));
            ExecutionResult::success(msg.gas, Vec::new())
        }
        _ => {
            seen.lock().unwrap().push(Seen::Witness {
                from: msg.input[0],
                depth: msg.depth,
                is_static: msg.is_static,
            });
            ExecutionResult::success(msg.gas, Vec::new())
        }
    })
}

fn chain_state() -> MemoryStateDb {
    let mut db = MemoryStateDb::new()
        .with_account(addr(0xaa), U256::from(1_000u64), vec![])
        .with_account(addr(WITNESS), U256::zero(), vec![0x02]);
    for k in 1..=5u8 {
        db = db.with_account(level(k), U256::zero(), vec![0x01, k]);
    }
    db
}

// ==================== Depth and Read-Only Tests ====================

#[test]
fn test_depth_and_read_only_discipline() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = EngineRegistry::new();
    registry
        .register(Capability::Evm1, chain_engine(Arc::clone(&seen)).shared())
        .unwrap();

    let mut db = chain_state();
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let origin = CallFrame::external(addr(0xaa), GAS);
    let ret = evm.call(&origin, level(1), &[], GAS, U256::zero());
    assert_eq!(ret.result, Ok(Vec::new()));
    assert_eq!(evm.depth(), 0);
    assert!(!evm.is_read_only());

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            Seen::Level { k: 1, depth: 0, is_static: false },
            Seen::Level { k: 2, depth: 1, is_static: false },
            Seen::Level { k: 3, depth: 2, is_static: true },
            Seen::Level { k: 4, depth: 3, is_static: true },
            Seen::Level { k: 5, depth: 4, is_static: true },
            // level 4 survives the failure of level 5 and stays read-only
            Seen::Witness { from: 4, depth: 4, is_static: true },
            // level 4 did not clear the flag it inherited
            Seen::Witness { from: 3, depth: 3, is_static: true },
            // level 3 was the frame that set it, so it is gone again
            Seen::Witness { from: 2, depth: 2, is_static: false },
            Seen::Witness { from: 1, depth: 1, is_static: false },
        ]
    );
}

/// Same chain shape across both engines: odd levels run EVM code, even
/// levels wasm code, level 4 fails. The witness contract is EVM code.
fn mixed_engine(seen: Arc<Mutex<Vec<(Capability, Seen)>>>, capability: Capability) -> ScriptedEngine {
    ScriptedEngine::new(move |host, msg, code| {
        if msg.destination == addr(WITNESS) {
            seen.lock().unwrap().push((
                capability,
                Seen::Witness {
                    from: msg.input[0],
                    depth: msg.depth,
                    is_static: msg.is_static,
                },
            ));
            return ExecutionResult::success(msg.gas, Vec::new());
        }

        let k = code[code.len() - 1];
        seen.lock().unwrap().push((
            capability,
            Seen::Level {
                k,
                depth: msg.depth,
                is_static: msg.is_static,
            },
        ));
        if k == 4 {
            return ExecutionResult::failure(StatusCode::InvalidInstruction);
        }

        let mut next = CallMessage::call(level(k + 1), Vec::new(), GAS, U256::zero());
        if k == 1 {
            next = next.static_call();
        }
        let outcome = host.call(next);
        let expected = if k == 3 { CallStatus::Failure } else { CallStatus::Success };
        assert_eq!(outcome.status, expected);

        host.call(CallMessage::call(addr(WITNESS), vec![k], GAS, U256::zero()));
        ExecutionResult::success(msg.gas, Vec::new())
    })
    .with_capabilities(&[capability])
}

#[test]
fn test_read_only_survives_engine_switch() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = EngineRegistry::new();
    registry
        .register(Capability::Evm1, mixed_engine(Arc::clone(&seen), Capability::Evm1).shared())
        .unwrap();
    registry
        .register(Capability::Ewasm, mixed_engine(Arc::clone(&seen), Capability::Ewasm).shared())
        .unwrap();

    let wasm = |k: u8| vec![0x00, 0x61, 0x73, 0x6d, k];
    let mut db = MemoryStateDb::new()
        .with_account(addr(0xaa), U256::from(1_000u64), vec![])
        .with_account(addr(WITNESS), U256::zero(), vec![0x02])
        .with_account(level(1), U256::zero(), vec![0x01, 1])
        .with_account(level(2), U256::zero(), wasm(2))
        .with_account(level(3), U256::zero(), vec![0x01, 3])
        .with_account(level(4), U256::zero(), wasm(4));
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let origin = CallFrame::external(addr(0xaa), GAS);
    let ret = evm.call(&origin, level(1), &[], GAS, U256::zero());
    assert_eq!(ret.result, Ok(Vec::new()));
    assert_eq!(evm.depth(), 0);
    assert!(!evm.is_read_only());

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            (Capability::Evm1, Seen::Level { k: 1, depth: 0, is_static: false }),
            // static call from EVM into wasm
            (Capability::Ewasm, Seen::Level { k: 2, depth: 1, is_static: true }),
            // plain call from wasm back into EVM inherits the flag
            (Capability::Evm1, Seen::Level { k: 3, depth: 2, is_static: true }),
            (Capability::Ewasm, Seen::Level { k: 4, depth: 3, is_static: true }),
            (Capability::Evm1, Seen::Witness { from: 3, depth: 3, is_static: true }),
            (Capability::Evm1, Seen::Witness { from: 2, depth: 2, is_static: true }),
            (Capability::Evm1, Seen::Witness { from: 1, depth: 1, is_static: false }),
        ]
    );
}

#[test]
fn test_depth_restored_after_engine_panic() {
    let engine = ScriptedEngine::new(|_, _, _| panic!("engine aborted"));
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new().with_account(addr(0x01), U256::zero(), vec![0x60]);
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        evm.static_call(&CallFrame::external(addr(0xaa), GAS), addr(0x01), &[], GAS)
    }));
    assert!(unwound.is_err());
    assert_eq!(evm.depth(), 0);
    assert!(!evm.is_read_only());
}

#[test]
fn test_depth_restored_after_internal_error() {
    let engine = ScriptedEngine::new(|_, _, _| ExecutionResult::failure(StatusCode::InternalError))
        .named("broken");
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new().with_account(addr(0x01), U256::zero(), vec![0x60]);
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let ret = evm.static_call(&CallFrame::external(addr(0xaa), GAS), addr(0x01), &[], GAS);
    assert_eq!(
        ret.result,
        Err(VmError::EngineInternal("internal error (broken)".to_string()))
    );
    assert_eq!(ret.gas_left, 0);
    assert_eq!(evm.depth(), 0);
    assert!(!evm.is_read_only());
}

#[test]
fn test_run_empty_code_skips_engine() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let engine = ScriptedEngine::new(move |_, msg, _| {
        *counter.lock().unwrap() += 1;
        ExecutionResult::success(msg.gas, Vec::new())
    });
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new();
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let mut frame = CallFrame::new(addr(0xaa), addr(0x01), U256::zero(), 10);
    assert_eq!(evm.run(&mut frame, &[1, 2], true), Ok(Vec::new()));
    assert_eq!(evm.depth(), 0);
    assert_eq!(*calls.lock().unwrap(), 0);
}

// ==================== Message Tests ====================

#[test]
fn test_message_fields_and_revision() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let engine = ScriptedEngine::new(move |_, msg, _| {
        *sink.lock().unwrap() = Some((msg.kind, msg.sender, msg.destination, msg.value, msg.input.to_vec()));
        ExecutionResult::success(msg.gas - 21, vec![0x2a])
    });
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new()
        .with_account(addr(0xaa), U256::from(50u64), vec![])
        .with_account(addr(0x01), U256::zero(), vec![0x60]);
    let schedule = ForkSchedule::foundation();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(4_370_000), &mut db, &schedule, &hashes, &registry);
    assert_eq!(evm.revision(), Revision::Byzantium);

    let ret = evm.call(&CallFrame::external(addr(0xaa), GAS), addr(0x01), &[7, 7], GAS, U256::from(5u64));
    assert_eq!(ret.result, Ok(vec![0x2a]));
    assert_eq!(ret.gas_left, GAS - 21);
    assert_eq!(
        seen.lock().unwrap().clone(),
        Some((CallKind::Call, addr(0xaa), addr(0x01), U256::from(5u64), vec![7, 7]))
    );
    drop(evm);
    assert_eq!(db.get_balance(&addr(0x01)), U256::from(5u64));
}

#[test]
fn test_revert_keeps_gas_and_rolls_back() {
    let engine = ScriptedEngine::new(|host, msg, _| {
        host.set_storage(msg.destination, H256::from_low_u64(1), H256::from_low_u64(9));
        ExecutionResult::revert(msg.gas / 2, vec![0xbe, 0xef])
    });
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new()
        .with_account(addr(0xaa), U256::from(50u64), vec![])
        .with_account(addr(0x01), U256::zero(), vec![0x60]);
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let ret = evm.call(&CallFrame::external(addr(0xaa), GAS), addr(0x01), &[], GAS, U256::from(10u64));
    assert_eq!(ret.result, Err(VmError::Reverted(vec![0xbe, 0xef])));
    assert_eq!(ret.gas_left, GAS / 2);
    drop(evm);

    assert_eq!(db.get_state(&addr(0x01), &H256::from_low_u64(1)), H256::ZERO);
    assert_eq!(db.get_balance(&addr(0xaa)), U256::from(50u64));
}

#[test]
fn test_failure_consumes_gas() {
    let engine = ScriptedEngine::new(|_, msg, _| ExecutionResult {
        status: StatusCode::StackUnderflow,
        gas_left: msg.gas,
        output: vec![1],
    });
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new().with_account(addr(0x01), U256::zero(), vec![0x60]);
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let ret = evm.call(&CallFrame::external(addr(0xaa), GAS), addr(0x01), &[], GAS, U256::zero());
    assert_eq!(ret.result, Err(VmError::Execution(StatusCode::StackUnderflow)));
    assert_eq!(ret.gas_left, 0);
}

// ==================== Engine Selection Tests ====================

#[test]
fn test_wasm_code_needs_ewasm_engine() {
    let wasm = b"\0asm\x01\0\0\0".to_vec();
    let mut db = MemoryStateDb::new().with_account(addr(0x01), U256::zero(), wasm);
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let origin = CallFrame::external(addr(0xaa), GAS);

    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, ScriptedEngine::noop().shared()).unwrap();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);
    let ret = evm.call(&origin, addr(0x01), &[], GAS, U256::zero());
    assert_eq!(ret.result, Err(VmError::NoCompatibleInterpreter));
    drop(evm);

    let ewasm = ScriptedEngine::new(|_, msg, _| ExecutionResult::success(msg.gas, b"wasm".to_vec()))
        .named("wasm")
        .with_capabilities(&[Capability::Ewasm]);
    registry.register(Capability::Ewasm, ewasm.shared()).unwrap();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);
    let ret = evm.call(&origin, addr(0x01), &[], GAS, U256::zero());
    assert_eq!(ret.result, Ok(b"wasm".to_vec()));
}

#[test]
fn test_bridge_can_run() {
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, ScriptedEngine::noop().shared()).unwrap();
    let bridges = registry.bridges();
    assert_eq!(bridges.len(), 1);
    assert_eq!(bridges[0].capability(), Capability::Evm1);
    assert!(bridges[0].can_run(&[0x60, 0x00]));
    assert!(!bridges[0].can_run(b"\0asm"));
}

// ==================== Host Surface Tests ====================

#[test]
fn test_block_hash_through_engine() {
    let engine = ScriptedEngine::new(|host, msg, _| {
        let mut out = Vec::new();
        for n in [999u64, 744, 743, 1000] {
            out.extend_from_slice(host.get_block_hash(n).as_bytes());
        }
        ExecutionResult::success(msg.gas, out)
    });
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new().with_account(addr(0x01), U256::zero(), vec![0x60]);
    let schedule = ForkSchedule::all_from_genesis();
    let hashes: HashMap<BlockNumber, H256> = (0..1000).map(|n| (n, H256::from_low_u64(n + 1))).collect();
    let mut evm = Evm::new(env_at(1000), &mut db, &schedule, &hashes, &registry);

    let out = evm
        .call(&CallFrame::external(addr(0xaa), GAS), addr(0x01), &[], GAS, U256::zero())
        .result
        .unwrap();
    let words: Vec<H256> = out.chunks(32).map(|c| H256::from_slice(c).unwrap()).collect();
    assert_eq!(
        words,
        vec![H256::from_low_u64(1000), H256::from_low_u64(745), H256::ZERO, H256::ZERO]
    );
}

#[test]
fn test_legacy_set_and_clear_through_engine() {
    let engine = ScriptedEngine::new(|host, msg, _| {
        let slot = H256::from_low_u64(1);
        host.set_storage(msg.destination, slot, H256::from_low_u64(5));
        host.set_storage(msg.destination, slot, H256::ZERO);
        ExecutionResult::success(msg.gas, Vec::new())
    });
    let mut registry = EngineRegistry::new();
    registry.register(Capability::Evm1, engine.shared()).unwrap();

    let mut db = MemoryStateDb::new().with_account(addr(0x01), U256::zero(), vec![0x60]);
    let schedule = ForkSchedule::frontier();
    let hashes: HashMap<BlockNumber, H256> = HashMap::new();
    let mut evm = Evm::new(env_at(1), &mut db, &schedule, &hashes, &registry);

    let ret = evm.call(&CallFrame::external(addr(0xaa), GAS), addr(0x01), &[], GAS, U256::zero());
    assert!(ret.result.is_ok());
    drop(evm);
    assert_eq!(db.get_refund(), 15_000);
    assert_eq!(db.get_state(&addr(0x01), &H256::from_low_u64(1)), H256::ZERO);
}
