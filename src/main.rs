//! Firmware-in-the-loop host binary.
//!
//! Runs the real control core — signal handler plus motor controller —
//! against simulated hardware: a producer thread plays the CAN receive
//! interrupt and injects motor-control frames, while the main thread runs
//! the cooperative task loop (`process` + `update` every tick, status
//! frame out every status period).

mod settings;
mod sim;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use torqbus_hal::MotorStatus;
use torqbus_motor::{MotorController, MotorReport};
use torqbus_signals::catalog::MotorControl;
use torqbus_signals::{SignalHandler, SignalId};

/// Application mode codes carried by the 4-bit mode signals.
const MODE_COAST: u8 = 0;
const MODE_RUN: u8 = 1;
const MODE_BRAKE: u8 = 2;

type Controller = MotorController<sim::SimMotor, sim::WallClock, Arc<sim::ActivityMonitor>>;
type Handler = SignalHandler<sim::BusLog, Arc<sim::ActivityMonitor>>;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = settings::load().context("loading configuration")?;
    let motor_count = settings.motors.count as usize;

    let board = sim::SimBoard::new(&settings);
    let clock = sim::WallClock::new();
    let monitor = Arc::new(sim::ActivityMonitor::default());
    let bus = sim::BusLog::default();

    let controller = Arc::new(Mutex::new(
        MotorController::new(&board, &settings, clock, Arc::clone(&monitor))
            .context("initializing motor controller")?,
    ));
    let handler = Arc::new(Mutex::new(SignalHandler::new(
        bus.clone(),
        Arc::clone(&monitor),
    )));

    wire_signals(&handler, &controller, motor_count);

    // ISR stand-in: injects motor-control frames from another thread. The
    // mutex around the handler is the critical section that serializes the
    // listener against `process`.
    let producer_handler = Arc::clone(&handler);
    let producer = thread::spawn(move || drive_profile(&producer_handler));

    let tick = Duration::from_millis(settings.schedule.tick_ms);
    let ticks = settings.schedule.run_ms / settings.schedule.tick_ms;
    let status_every = settings.schedule.status_period_ms / settings.schedule.tick_ms;

    info!(ticks, "task loop starting");
    for n in 1..=ticks {
        handler.lock().process();
        controller.lock().update();
        if n % status_every == 0 {
            send_status(&handler, &controller, motor_count);
        }
        spin_sleep::sleep(tick);
    }

    producer
        .join()
        .map_err(|_| anyhow::anyhow!("frame producer thread panicked"))?;

    let controller = controller.lock();
    for index in 0..motor_count {
        let report = controller.status(index);
        info!(
            index,
            rpm = report.actual_rpm,
            current = report.actual_current,
            status = %report.status,
            position = controller.position(index),
            "final motor state"
        );
    }
    info!(
        status_frames = bus.transmitted(),
        watchdog_feeds = monitor.feeds(),
        activity_reports = monitor.activity(),
        "simulation finished"
    );
    Ok(())
}

/// Forward each decoded signal to the motor controller.
fn wire_signals(handler: &Arc<Mutex<Handler>>, controller: &Arc<Mutex<Controller>>, motor_count: usize) {
    let mut handler = handler.lock();

    let ctl = Arc::clone(controller);
    handler.register_handler(SignalId::Rpm1, move |signal| {
        ctl.lock().set_rpm(0, signal.value);
    });
    let ctl = Arc::clone(controller);
    handler.register_handler(SignalId::Current1, move |signal| {
        ctl.lock().set_current(0, signal.value);
    });
    let ctl = Arc::clone(controller);
    handler.register_handler(SignalId::Mode1, move |signal| {
        apply_mode(&mut ctl.lock(), 0, signal.value);
    });

    if motor_count > 1 {
        let ctl = Arc::clone(controller);
        handler.register_handler(SignalId::Rpm2, move |signal| {
            ctl.lock().set_rpm(1, signal.value);
        });
        let ctl = Arc::clone(controller);
        handler.register_handler(SignalId::Current2, move |signal| {
            ctl.lock().set_current(1, signal.value);
        });
        let ctl = Arc::clone(controller);
        handler.register_handler(SignalId::Mode2, move |signal| {
            apply_mode(&mut ctl.lock(), 1, signal.value);
        });
    }
}

fn apply_mode(controller: &mut Controller, index: usize, code: i32) {
    match code {
        c if c == i32::from(MODE_COAST) => controller.coast(index),
        c if c == i32::from(MODE_RUN) => controller.run(index),
        c if c == i32::from(MODE_BRAKE) => controller.brake(index),
        _ => warn!(index, code, "unknown mode code"),
    }
}

/// Injected bus traffic: ramp motor 1 up to 3000 RPM, run motor 2 in
/// reverse, then coast both.
fn drive_profile(handler: &Arc<Mutex<Handler>>) {
    for step in 0..100i32 {
        let message = MotorControl {
            rpm1: (step * 60).min(3000),
            rpm2: -1200,
            current1: 3500,
            current2: 3500,
            mode1: MODE_RUN,
            mode2: MODE_RUN,
        };
        inject(handler, &message);
        thread::sleep(Duration::from_millis(20));
    }
    inject(
        handler,
        &MotorControl {
            rpm1: 0,
            rpm2: 0,
            current1: 0,
            current2: 0,
            mode1: MODE_COAST,
            mode2: MODE_COAST,
        },
    );
}

fn inject(handler: &Arc<Mutex<Handler>>, message: &MotorControl) {
    match message.encode() {
        Some(frame) => handler.lock().listener(&frame),
        None => warn!(?message, "control message outside encodable range"),
    }
}

/// Collect per-motor reports and put one status frame on the bus.
fn send_status(handler: &Arc<Mutex<Handler>>, controller: &Arc<Mutex<Controller>>, motor_count: usize) {
    let idle = MotorReport {
        actual_rpm: 0,
        target_rpm: 0,
        actual_current: 0,
        target_current: 0,
        status: MotorStatus::Coast,
    };
    let (report1, report2) = {
        let controller = controller.lock();
        let report1 = controller.status(0);
        let report2 = if motor_count > 1 { controller.status(1) } else { idle };
        (report1, report2)
    };
    let status = report1.status.as_u8() | report2.status.as_u8() << 4;
    if let Err(err) = handler.lock().send_motor_status(
        report1.actual_rpm,
        report1.actual_current,
        report2.actual_rpm,
        report2.actual_current,
        status,
    ) {
        warn!(%err, "status frame not sent");
    }
}
