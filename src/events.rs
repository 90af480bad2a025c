//! Timer-driven event system.
//!
//! Events are produced by the periodic esp_timer callbacks in
//! [`drivers::hw_timer`](crate::drivers::hw_timer), one per task cadence,
//! and consumed by the main loop one at a time.  The dimmer interrupts
//! never touch this queue; they share only atomics with task context.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ sensor tick │────▶│              │     │              │
//! │ control tick│────▶│  Event Queue │────▶│  Main Loop   │
//! │ telem/disp  │────▶│  (lock-free) │     │  (consumer)  │
//! │ cmd poll    │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 32;

/// Periodic work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Feedback-loop tick (250 ms).
    ControlTick            = 0,
    /// Single-wire sensor acquisition (2 s).
    SensorReadTick         = 1,
    /// Analog probe sample (2 s).
    ProbeReadTick          = 2,
    /// Inbound command poll (500 ms).
    CommandPollTick        = 3,
    /// Telemetry send (2 s).
    TelemetryTick          = 4,
    /// Status screen refresh (3 s).
    DisplayTick            = 5,
}

impl Event {
    /// Decode a raw discriminant, as carried through a timer callback arg.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::ControlTick),
            1 => Some(Self::SensorReadTick),
            2 => Some(Self::ProbeReadTick),
            3 => Some(Self::CommandPollTick),
            4 => Some(Self::TelemetryTick),
            5 => Some(Self::DisplayTick),
            _ => None,
        }
    }
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// The esp_timer task writes (produce), main loop reads (consume).
// Uses atomic head/tail indices.  The buffer lives in a static so
// timer callbacks can reach it without a context pointer.

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
// SAFETY: EVENT_BUFFER is only touched through push_event (single
// producer: the esp_timer task) and pop_event (single consumer: the main
// loop).  A slot is written before head is published with Release and
// read after head is observed with Acquire.
static mut EVENT_BUFFER: [u8; EVENT_QUEUE_CAP] = [0; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Safe to call from the timer task (lock-free).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Queue full, drop event.
    }

    // SAFETY: single producer; the consumer never reads slot `head`
    // until the Release store below publishes it.
    unsafe {
        EVENT_BUFFER[head as usize] = event as u8;
    }

    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
/// Returns `None` if the queue is empty.
pub fn pop_event() -> Option<Event> {
    loop {
        let tail = EVENT_TAIL.load(Ordering::Relaxed);
        let head = EVENT_HEAD.load(Ordering::Acquire);

        if tail == head {
            return None; // Empty.
        }

        // SAFETY: single consumer; slot `tail` was published by the
        // producer's Release store of head observed above.
        let raw = unsafe { EVENT_BUFFER[tail as usize] };
        EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

        if let Some(event) = Event::from_u8(raw) {
            return Some(event);
        }
    }
}

/// Drain all pending events into a callback.
/// Processes events in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Check if the event queue is empty.
pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}
