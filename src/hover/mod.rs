/// Handle for one scheduled hover timeout.
pub type Ticket = u64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HoverState {
    Idle,
    Pending { ticket: Ticket, due_ms: f64 },
}

/// Mouse-stop debounce: fires once the pointer has been still for `delay_ms`.
///
/// Every move cancels the pending timeout and schedules a new one. A timeout that fires with an
/// old ticket is ignored.
#[derive(Debug)]
pub struct HoverTimer {
    delay_ms: u32,
    next_ticket: Ticket,
    state: HoverState,
}

impl HoverTimer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            next_ticket: 1,
            state: HoverState::Idle,
        }
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, HoverState::Pending { .. })
    }

    pub fn restart(&mut self, now_ms: f64) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.state = HoverState::Pending {
            ticket,
            due_ms: now_ms + self.delay_ms as f64,
        };
        ticket
    }

    pub fn cancel(&mut self) {
        self.state = HoverState::Idle;
    }

    /// Host timer callback. True if `ticket` is the live one; the timer goes idle.
    pub fn fire(&mut self, ticket: Ticket) -> bool {
        match self.state {
            HoverState::Pending { ticket: live, .. } if live == ticket => {
                self.state = HoverState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Virtual-time driver: fires if the pending timeout is due at `now_ms`.
    pub fn poll(&mut self, now_ms: f64) -> Option<Ticket> {
        match self.state {
            HoverState::Pending { ticket, due_ms } if now_ms >= due_ms => {
                self.state = HoverState::Idle;
                Some(ticket)
            }
            _ => None,
        }
    }
}
