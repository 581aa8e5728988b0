//! In-memory kernel for tests and dry runs.
//!
//! Models just enough of the Linux behavior to exercise the provisioning
//! operations: attaching creates an interface, the netmask cannot be set
//! before an address, and unknown names fail with `ENODEV`. Every call is
//! recorded, and any operation can be made to fail with a chosen errno.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::os::fd::BorrowedFd;
use std::rc::Rc;

use nix::errno::Errno;
use tracing::info;

use super::{ControlSocket, Kernel};
use crate::flags::InterfaceFlags;
use crate::name::InterfaceName;

/// Index space the kernel searches when expanding a `%d` name template.
const TEMPLATE_SLOTS: usize = 32768;

/// Flags a freshly attached TUN interface reports.
const TUN_DEFAULT_FLAGS: u16 =
    InterfaceFlags::POINTOPOINT | InterfaceFlags::NOARP | InterfaceFlags::MULTICAST;

/// Kernel operations that can have failures injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Attach,
    OpenSocket,
    SetAddress,
    SetNetmask,
    ReadFlags,
    WriteFlags,
    CloseSocket,
}

/// A recorded kernel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelCall {
    Attach { name: String },
    OpenSocket,
    SetAddress { name: String, address: Ipv4Addr },
    SetNetmask { name: String, netmask: Ipv4Addr },
    ReadFlags { name: String },
    WriteFlags { name: String, flags: InterfaceFlags },
    CloseSocket,
}

impl KernelCall {
    pub fn operation(&self) -> Operation {
        match self {
            KernelCall::Attach { .. } => Operation::Attach,
            KernelCall::OpenSocket => Operation::OpenSocket,
            KernelCall::SetAddress { .. } => Operation::SetAddress,
            KernelCall::SetNetmask { .. } => Operation::SetNetmask,
            KernelCall::ReadFlags { .. } => Operation::ReadFlags,
            KernelCall::WriteFlags { .. } => Operation::WriteFlags,
            KernelCall::CloseSocket => Operation::CloseSocket,
        }
    }
}

/// State of one simulated interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockInterface {
    pub flags: InterfaceFlags,
    pub address: Option<Ipv4Addr>,
    pub netmask: Option<Ipv4Addr>,
    /// Whether a device handle is currently bound to it.
    pub attached: bool,
}

impl Default for MockInterface {
    fn default() -> Self {
        Self {
            flags: InterfaceFlags::from_bits(TUN_DEFAULT_FLAGS),
            address: None,
            netmask: None,
            attached: false,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    interfaces: BTreeMap<String, MockInterface>,
    calls: Vec<KernelCall>,
    failures: HashMap<Operation, Errno>,
    open_sockets: usize,
}

impl State {
    fn record(&mut self, call: KernelCall) -> Result<(), Errno> {
        let op = call.operation();
        info!(call = ?call, "[MOCK] kernel call");
        self.calls.push(call);
        match self.failures.get(&op) {
            Some(errno) => Err(*errno),
            None => Ok(()),
        }
    }

    fn interface(&mut self, name: &InterfaceName) -> Result<&mut MockInterface, Errno> {
        self.interfaces.get_mut(name.as_str()).ok_or(Errno::ENODEV)
    }

    /// Resolve a `%d` template to the lowest unused index, as the kernel's
    /// name allocator does. Plain names pass through unchanged.
    fn allocate_name(&self, name: &InterfaceName) -> Result<InterfaceName, Errno> {
        let Some((prefix, rest)) = name.as_str().split_once('%') else {
            return Ok(name.clone());
        };
        let suffix = match rest.strip_prefix('d') {
            Some(suffix) if !suffix.contains('%') => suffix,
            _ => return Err(Errno::EINVAL),
        };

        (0..TEMPLATE_SLOTS)
            .map(|index| format!("{prefix}{index}{suffix}"))
            .find(|candidate| !self.interfaces.contains_key(candidate))
            .ok_or(Errno::ENFILE)
            .and_then(|candidate| InterfaceName::new(candidate).map_err(|_| Errno::EINVAL))
    }
}

/// Mock kernel for testing and development.
///
/// Clones share state, so a test can keep one handle for inspection while
/// the code under test uses another.
#[derive(Debug, Clone, Default)]
pub struct MockKernel {
    state: Rc<RefCell<State>>,
}

impl MockKernel {
    /// Create a mock kernel with no interfaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock kernel where `name` already exists, detached and down.
    pub fn with_interface(name: &InterfaceName) -> Self {
        let kernel = Self::new();
        kernel
            .state
            .borrow_mut()
            .interfaces
            .insert(name.to_string(), MockInterface::default());
        kernel
    }

    /// Make every later call of `op` fail with `errno`.
    pub fn fail(&self, op: Operation, errno: Errno) {
        self.state.borrow_mut().failures.insert(op, errno);
    }

    /// Remove an injected failure.
    pub fn clear_failure(&self, op: Operation) {
        self.state.borrow_mut().failures.remove(&op);
    }

    /// Snapshot of one interface.
    pub fn interface(&self, name: &str) -> Option<MockInterface> {
        self.state.borrow().interfaces.get(name).cloned()
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<KernelCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of recorded calls of one kind.
    pub fn count(&self, op: Operation) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.operation() == op)
            .count()
    }

    /// Sockets opened and not yet closed.
    pub fn open_sockets(&self) -> usize {
        self.state.borrow().open_sockets
    }
}

impl Kernel for MockKernel {
    type Socket = MockSocket;

    fn attach_tun(
        &self,
        _device: BorrowedFd<'_>,
        name: &InterfaceName,
    ) -> Result<InterfaceName, Errno> {
        let mut state = self.state.borrow_mut();
        state.record(KernelCall::Attach {
            name: name.to_string(),
        })?;

        let bound = state.allocate_name(name)?;
        let iface = state.interfaces.entry(bound.to_string()).or_default();
        if iface.attached {
            return Err(Errno::EBUSY);
        }
        iface.attached = true;
        Ok(bound)
    }

    fn open_control_socket(&self) -> Result<MockSocket, Errno> {
        let mut state = self.state.borrow_mut();
        state.record(KernelCall::OpenSocket)?;
        state.open_sockets += 1;
        Ok(MockSocket {
            state: Rc::clone(&self.state),
        })
    }
}

/// Control socket handed out by [`MockKernel`].
#[derive(Debug)]
pub struct MockSocket {
    state: Rc<RefCell<State>>,
}

impl ControlSocket for MockSocket {
    fn set_address(&mut self, name: &InterfaceName, address: Ipv4Addr) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        state.record(KernelCall::SetAddress {
            name: name.to_string(),
            address,
        })?;
        let iface = state.interface(name)?;
        iface.address = Some(address);
        Ok(())
    }

    fn set_netmask(&mut self, name: &InterfaceName, netmask: Ipv4Addr) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        state.record(KernelCall::SetNetmask {
            name: name.to_string(),
            netmask,
        })?;
        let iface = state.interface(name)?;
        if iface.address.is_none() {
            return Err(Errno::EADDRNOTAVAIL);
        }
        iface.netmask = Some(netmask);
        Ok(())
    }

    fn flags(&mut self, name: &InterfaceName) -> Result<InterfaceFlags, Errno> {
        let mut state = self.state.borrow_mut();
        state.record(KernelCall::ReadFlags {
            name: name.to_string(),
        })?;
        Ok(state.interface(name)?.flags)
    }

    fn set_flags(&mut self, name: &InterfaceName, flags: InterfaceFlags) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        state.record(KernelCall::WriteFlags {
            name: name.to_string(),
            flags,
        })?;
        let iface = state.interface(name)?;
        // Carrier follows the admin bit while a handle is attached.
        let running = flags.is_up() && iface.attached;
        let bits = if running {
            flags.bits() | InterfaceFlags::RUNNING
        } else {
            flags.bits() & !InterfaceFlags::RUNNING
        };
        iface.flags = InterfaceFlags::from_bits(bits);
        Ok(())
    }

    fn close(self) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        // Like close(2) on Linux, the socket is gone even if an error is reported.
        state.open_sockets -= 1;
        state.record(KernelCall::CloseSocket)
    }
}
