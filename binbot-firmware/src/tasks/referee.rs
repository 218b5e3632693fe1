//! Referee link tasks
//!
//! The session task drives the handshake-then-poll machine from its
//! mailbox and transmits the frames it queues; the RX task reassembles
//! 3-byte reply frames and feeds the payload back as `ResponseReceived`
//! events. Phase and station edges the session detects are posted toward
//! Master by the session machine itself; this file only moves bytes.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use binbot_core::action::{Action, MAX_ACTIONS};
use binbot_core::behavior::MatchInfo;
use binbot_core::event::{Event, EventKind};
use binbot_core::hsm::Hsm;
use binbot_core::timer::Service;
use binbot_protocol::{Session, SessionCtx, FRAME_LEN, REPLY_PAYLOAD_INDEX};

use crate::channels::{
    ArmRequest, BEACON_PERIOD_US, COMPASS_EVENTS, MASTER_EVENTS, MATCH_INFO, TIMER_REQUESTS,
};

/// Session task - owns the state machine and the TX side of the UART
#[embassy_executor::task]
pub async fn referee_task(mut tx: BufferedUartTx, team: u8) {
    info!("Referee task started (team {})", team);

    let mut session = Session::new(team);
    let mut ctx = SessionCtx::default();
    let mut last_info: Option<MatchInfo> = None;

    session.start(&mut ctx, Event::entry());
    flush(&mut ctx, &mut tx).await;

    loop {
        let event = COMPASS_EVENTS.receive().await;
        session.run(&mut ctx, event);
        flush(&mut ctx, &mut tx).await;

        let info = session.match_info();
        if last_info != Some(info) {
            last_info = Some(info);
            BEACON_PERIOD_US.store(info.beacon_period_us, Ordering::Relaxed);
            MATCH_INFO.signal(info);
        }
    }
}

/// Transmit queued frames and route outbox traffic
async fn flush(ctx: &mut SessionCtx, tx: &mut BufferedUartTx) {
    for frame in ctx.tx.iter() {
        if let Err(e) = tx.write_all(frame).await {
            warn!("Referee TX error: {:?}", e);
        }
    }
    ctx.tx.clear();

    let actions: heapless::Vec<Action, MAX_ACTIONS> = ctx.outbox.take_actions().collect();
    for action in actions {
        if let Action::ArmTimer { id, ms } = action {
            TIMER_REQUESTS.send(ArmRequest { id, ms }).await;
        }
    }
    while let Some(posted) = ctx.outbox.pop_post_for(Service::Master) {
        MASTER_EVENTS.send(posted).await;
    }
}

/// RX task - reassembles reply frames and surfaces the payload byte
#[embassy_executor::task]
pub async fn referee_rx_task(mut rx: BufferedUartRx) {
    info!("Referee RX task started");

    let mut frame = [0u8; FRAME_LEN];
    let mut filled = 0;
    let mut buf = [0u8; 16];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    frame[filled] = byte;
                    filled += 1;
                    if filled == FRAME_LEN {
                        filled = 0;
                        let payload = frame[REPLY_PAYLOAD_INDEX];
                        trace!("Referee reply payload: {=u8:x}", payload);
                        COMPASS_EVENTS
                            .send(Event::with(EventKind::ResponseReceived, payload as u16))
                            .await;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Referee RX error: {:?}", e),
        }
    }
}
