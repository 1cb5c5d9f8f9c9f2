//! Input state queried by the core during a frame.

use crate::abi::{DEVICE_ANALOG, DEVICE_JOYPAD, DEVICE_MASK, DEVICE_NONE};
use parking_lot::RwLock;
use std::sync::Arc;

/// Joypad button ids 0..16 (B, Y, Select, Start, Up, Down, Left, Right, A, X, L, R, L2, R2, L3, R3).
pub const JOYPAD_BUTTONS: u32 = 16;

/// Answers the core's input queries.
pub trait InputSource: Send {
    /// Called once per frame when the core polls.
    fn poll(&mut self) {}

    /// Current value; 0 when the port is out of range or the device differs.
    fn state(&mut self, port: u32, device: u32, index: u32, id: u32) -> i16;
}

/// Always reports 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInput;

impl InputSource for NullInput {
    fn state(&mut self, _port: u32, _device: u32, _index: u32, _id: u32) -> i16 {
        0
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PortState {
    device: u32,
    buttons: u16,
    /// `[stick][axis]` for left/right stick, x/y.
    analog: [[i16; 2]; 2],
}

/// Shared port table. Clones share state, so a UI thread can update buttons
/// while the host owns another handle.
#[derive(Debug, Clone)]
pub struct InputPorts {
    ports: Arc<RwLock<Vec<PortState>>>,
    polls: Arc<std::sync::atomic::AtomicU64>,
}

impl InputPorts {
    /// `count` ports, all with a joypad attached.
    pub fn new(count: usize) -> Self {
        let port = PortState {
            device: DEVICE_JOYPAD,
            ..Default::default()
        };
        Self {
            ports: Arc::new(RwLock::new(vec![port; count])),
            polls: Arc::default(),
        }
    }

    pub fn port_count(&self) -> usize {
        self.ports.read().len()
    }

    pub fn set_device(&self, port: usize, device: u32) {
        if let Some(state) = self.ports.write().get_mut(port) {
            state.device = device;
            state.buttons = 0;
            state.analog = [[0; 2]; 2];
        }
    }

    pub fn device(&self, port: usize) -> Option<u32> {
        self.ports.read().get(port).map(|p| p.device)
    }

    pub fn set_button(&self, port: usize, id: u32, pressed: bool) {
        if id >= JOYPAD_BUTTONS {
            return;
        }
        if let Some(state) = self.ports.write().get_mut(port) {
            if pressed {
                state.buttons |= 1 << id;
            } else {
                state.buttons &= !(1 << id);
            }
        }
    }

    pub fn set_analog(&self, port: usize, stick: usize, axis: usize, value: i16) {
        if let Some(state) = self.ports.write().get_mut(port) {
            if let Some(slot) = state.analog.get_mut(stick).and_then(|s| s.get_mut(axis)) {
                *slot = value;
            }
        }
    }

    pub fn release_all(&self) {
        for state in self.ports.write().iter_mut() {
            state.buttons = 0;
            state.analog = [[0; 2]; 2];
        }
    }

    /// Polls seen since creation.
    pub fn polls(&self) -> u64 {
        self.polls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl Default for InputPorts {
    fn default() -> Self {
        Self::new(2)
    }
}

impl InputSource for InputPorts {
    fn poll(&mut self) {
        self.polls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    fn state(&mut self, port: u32, device: u32, index: u32, id: u32) -> i16 {
        let ports = self.ports.read();
        let Some(state) = ports.get(port as usize) else {
            return 0;
        };

        // Subclassed devices compare by their base type.
        let base = device & DEVICE_MASK;
        if base == DEVICE_NONE || base != state.device & DEVICE_MASK {
            return 0;
        }

        match base {
            DEVICE_JOYPAD if id < JOYPAD_BUTTONS => ((state.buttons >> id) & 1) as i16,
            DEVICE_ANALOG => state
                .analog
                .get(index as usize)
                .and_then(|stick| stick.get(id as usize))
                .copied()
                .unwrap_or(0),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_input_is_zero() {
        assert_eq!(NullInput.state(0, DEVICE_JOYPAD, 0, 0), 0);
    }

    #[test]
    fn test_button_state() {
        let ports = InputPorts::new(2);
        let mut source = ports.clone();

        ports.set_button(0, 8, true);
        assert_eq!(source.state(0, DEVICE_JOYPAD, 0, 8), 1);
        assert_eq!(source.state(0, DEVICE_JOYPAD, 0, 0), 0);

        ports.set_button(0, 8, false);
        assert_eq!(source.state(0, DEVICE_JOYPAD, 0, 8), 0);
    }

    #[test]
    fn test_out_of_range_port_and_device_mismatch() {
        let ports = InputPorts::new(1);
        let mut source = ports.clone();
        ports.set_button(0, 3, true);

        assert_eq!(source.state(5, DEVICE_JOYPAD, 0, 3), 0);
        assert_eq!(source.state(0, crate::abi::DEVICE_MOUSE, 0, 3), 0);
        assert_eq!(source.state(0, DEVICE_JOYPAD, 0, 99), 0);
    }

    #[test]
    fn test_subclassed_device_matches_base() {
        let ports = InputPorts::new(1);
        let mut source = ports.clone();
        ports.set_button(0, 0, true);

        let subclass = (1 << crate::abi::DEVICE_TYPE_SHIFT) | DEVICE_JOYPAD;
        assert_eq!(source.state(0, subclass, 0, 0), 1);
    }

    #[test]
    fn test_analog_axes() {
        let ports = InputPorts::new(1);
        ports.set_device(0, DEVICE_ANALOG);
        ports.set_analog(0, 1, 0, -12000);

        let mut source = ports.clone();
        assert_eq!(source.state(0, DEVICE_ANALOG, 1, 0), -12000);
        assert_eq!(source.state(0, DEVICE_ANALOG, 0, 0), 0);

        ports.release_all();
        assert_eq!(source.state(0, DEVICE_ANALOG, 1, 0), 0);
    }

    #[test]
    fn test_polls_counted() {
        let ports = InputPorts::new(1);
        let mut source = ports.clone();
        source.poll();
        source.poll();
        assert_eq!(ports.polls(), 2);
    }
}
