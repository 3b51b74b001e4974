//! Bridge between the call stack and one loaded engine

use crate::context::CallFrame;
use crate::engine::{CallKind, Capability, Engine, ExecutionMessage, StatusCode};
use crate::error::{VmError, VmResult};
use crate::evm::{Evm, FrameGuard};
use crate::host::HostContext;
use fugue_primitives::H256;
use std::fmt;
use std::sync::Arc;

/// A loaded engine and the capability it serves
#[derive(Clone)]
pub struct EngineBridge {
    engine: Arc<dyn Engine>,
    capability: Capability,
}

impl EngineBridge {
    /// Bridge `engine` for code of the given capability
    pub fn new(engine: Arc<dyn Engine>, capability: Capability) -> Self {
        Self { engine, capability }
    }

    /// The bridged engine
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Capability this bridge serves
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Whether this bridge accepts `code`
    pub fn can_run(&self, code: &[u8]) -> bool {
        Capability::required_for(code) == self.capability
    }

    /// Execute `frame` with `input`.
    ///
    /// The depth counter is raised for the duration of the call. The
    /// read-only flag lives on the `Evm`, so once set it stays set across
    /// engines until the frame that set it returns.
    pub fn run(
        &self,
        evm: &mut Evm<'_>,
        frame: &mut CallFrame,
        input: &[u8],
        read_only: bool,
    ) -> VmResult<Vec<u8>> {
        let mut evm = FrameGuard::enter(evm, read_only);
        if frame.code.is_empty() {
            return Ok(Vec::new());
        }

        // Init code runs before the account has code of its own
        let kind = if evm.state().get_code_size(&frame.address) == 0 {
            CallKind::Create
        } else {
            CallKind::Call
        };
        self.execute(&mut *evm, frame, input, kind)
    }

    fn execute(
        &self,
        evm: &mut Evm<'_>,
        frame: &mut CallFrame,
        input: &[u8],
        kind: CallKind,
    ) -> VmResult<Vec<u8>> {
        let revision = evm.revision();
        let message = ExecutionMessage {
            kind,
            is_static: evm.is_read_only(),
            depth: evm.depth() - 1,
            gas: frame.gas,
            destination: frame.address,
            sender: frame.caller,
            input,
            value: frame.value,
            create2_salt: H256::ZERO,
        };

        let result = {
            let mut host = HostContext::new(evm, frame);
            self.engine.execute(&mut host, revision, &message, &frame.code)
        };
        frame.gas = result.gas_left;

        match result.status {
            StatusCode::Success => Ok(result.output),
            StatusCode::Revert => Err(VmError::Reverted(result.output)),
            status if status.is_internal_error() => {
                tracing::error!(
                    "Engine {} internal error at {}: {}",
                    self.engine.name(),
                    frame.address,
                    status
                );
                Err(VmError::EngineInternal(format!("{} ({})", status, self.engine.name())))
            }
            status => Err(VmError::Execution(status)),
        }
    }
}

impl fmt::Debug for EngineBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBridge")
            .field("engine", &self.engine.name())
            .field("capability", &self.capability)
            .finish()
    }
}
