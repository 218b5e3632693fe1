//! Countdown timer bank task
//!
//! Sixteen independent one-shot slots. Arming a slot that is already
//! armed replaces its deadline; on expiry the slot posts a `Timeout`
//! event to the mailbox of the service the slot is bound to.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Timer};

use binbot_core::event::Event;
use binbot_core::timer::TimerId;

use crate::channels::{deliver, TIMER_REQUESTS};

/// Slots provided by the bank
const SLOT_COUNT: usize = 16;

#[embassy_executor::task]
pub async fn timer_bank_task() {
    info!("Timer bank task started");

    let mut deadlines: [Option<Instant>; SLOT_COUNT] = [None; SLOT_COUNT];

    loop {
        let next = deadlines.iter().flatten().copied().min();

        let request = match next {
            Some(at) => match select(TIMER_REQUESTS.receive(), Timer::at(at)).await {
                Either::First(req) => Some(req),
                Either::Second(()) => None,
            },
            None => Some(TIMER_REQUESTS.receive().await),
        };

        if let Some(req) = request {
            // Overwriting cancels any prior deadline in the slot
            deadlines[req.id as u16 as usize] =
                Some(Instant::now() + Duration::from_millis(req.ms as u64));
            continue;
        }

        // Fire every slot whose deadline has passed
        let now = Instant::now();
        for slot in 0..SLOT_COUNT {
            let expired = matches!(deadlines[slot], Some(at) if at <= now);
            if !expired {
                continue;
            }
            deadlines[slot] = None;
            if let Some(id) = TimerId::from_param(slot as u16) {
                trace!("Timer {:?} expired", id);
                deliver(id.destination(), Event::timeout(id)).await;
            }
        }
    }
}
