//! `rsu-cli` – Roadside unit
//!
//! This binary brings up one intersection controller and runs it until it is
//! interrupted.  It:
//!
//! 1. Initialises tracing and loads `~/.rsu/config.toml` (or defaults).
//! 2. Claims the six signal lines and the character display, and puts the
//!    lights into their default mode.  Any failure here exits with status 1.
//! 3. Starts the configured event sources (MQTT broker, keyboard, or both)
//!    and feeds them through one serialized controller loop.
//! 4. On **Ctrl-C** blanks the display, drives every line low and exits 0.
//!
//! The board drivers here are the simulated ones from `rsu-hal`; a real GPIO
//! or LCD backend plugs in through the same `OutputLine` / `CharDisplay`
//! traits.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use rsu_hal::{SimBank, SimDisplay};
use rsu_middleware::{EventBus, ManualTrigger, MqttTransport, Transport, pump};
use rsu_runtime::{EventController, IntersectionContext, Service, telemetry};
use rsu_signal::TokioWaiter;
use rsu_types::RsuError;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;

fn main() -> ExitCode {
    let guard = telemetry::init_tracing("rsu");
    print_banner();

    let cfg = match config::load().and_then(|cfg| cfg.validate().map(|()| cfg)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {e}", "Config error".red().bold());
            error!(error = %e, path = %config::config_path().display(), "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    print_summary(&cfg);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(run(cfg));

    // Stdin reads cannot be cancelled; do not wait on them.
    runtime.shutdown_background();
    drop(guard);
    code
}

async fn run(cfg: Config) -> ExitCode {
    let controller = match bring_up(&cfg) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {e}", "Startup failed".red().bold());
            error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    // ── Shutdown signal ───────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – releasing signal heads …".yellow().bold());
        shutdown_tx.send_replace(true);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; outputs are only released when the sources close");
    }

    // ── Event sources ─────────────────────────────────────────────────────
    let bus = EventBus::default();
    let service = match Service::new(controller, &bus, cfg.topic.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "event bus unavailable");
            return ExitCode::FAILURE;
        }
    };

    let mut sources: Vec<Box<dyn Transport>> = Vec::new();
    if cfg.source.uses_mqtt() {
        sources.push(Box::new(MqttTransport::new(&cfg.mqtt_settings())));
    }
    if cfg.source.uses_manual() {
        println!("  Press {} to toggle emergency mode.", "Enter".bold());
        sources.push(Box::new(ManualTrigger::stdin().following(service.granted())));
    }
    for transport in sources {
        let topic = cfg.topic.clone();
        let bus = bus.clone();
        tokio::spawn(async move {
            let name = transport.name().to_string();
            if let Err(e) = pump(transport, topic, bus).await {
                error!(transport = %name, error = %e, "event source failed");
            }
        });
    }
    // The service ends on its own once every source has closed.
    drop(bus);

    match service.run(shutdown_rx).await {
        Ok(summary) => {
            info!(messages = summary.messages(), faults = summary.faults, "roadside unit stopped");
            println!("{}", "  ✓ Signal heads released.".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "outputs could not be fully released");
            ExitCode::FAILURE
        }
    }
}

/// Claim outputs and the display and put the intersection in its default
/// mode.
fn bring_up(cfg: &Config) -> Result<EventController, RsuError> {
    let layout = cfg.layout();
    let outputs = SimBank::new().with_lines(layout.line_ids()).build();
    let display = SimDisplay::new(cfg.display.columns, cfg.display.rows);
    EventController::new(
        IntersectionContext {
            outputs,
            layout,
            display: Box::new(display),
            waiter: Arc::new(TokioWaiter),
        },
        cfg.timing()?,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ___  ___ _   _ "#.bold().cyan());
    println!("{}", r#"  | _ \/ __| | | |"#.bold().cyan());
    println!("{}", r#"  |   /\__ \ |_| |"#.bold().cyan());
    println!("{}", r#"  |_|_\|___/\___/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "RSU".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Emergency-vehicle signal preemption");
    println!();
}

fn print_summary(cfg: &Config) {
    println!("  Config      {}", config::config_path().display().to_string().dimmed());
    println!("  Topic       {}", cfg.topic.bold());
    println!("  Source      {}", cfg.source.to_string().bold());
    if cfg.source.uses_mqtt() {
        println!("  Broker      {}:{}", cfg.mqtt_broker, cfg.mqtt_port);
    }
    println!(
        "  Heads       head1 {}/{}/{}  head2 {}/{}/{}",
        cfg.head1.red, cfg.head1.yellow, cfg.head1.green, cfg.head2.red, cfg.head2.yellow, cfg.head2.green
    );
    println!();
}
