//! Greenhouse Node Firmware: Main Entry Point
//!
//! Hexagonal architecture with timer-driven, event-queue execution.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ClimateSensors     HardwareAdapter    LogEventSink  TcpLink   │
//! │  (AM2302 + LM35)    (dimmer/fan/valve) (EventSink)   (peer)    │
//! │  LogDisplay         Esp32TimeAdapter                           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  PID · commands · telemetry · screen                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Zero-cross ISR + gptimer alarm (TriacDriver, interrupt-owned) │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use greenhouse::adapters::display::LogDisplay;
use greenhouse::adapters::hardware::{AdcChannel, HardwareAdapter};
use greenhouse::adapters::log_sink::LogEventSink;
use greenhouse::adapters::tcp_link::TcpLink;
use greenhouse::adapters::time::{Esp32TimeAdapter, SystemPulseClock};
use greenhouse::adapters::wifi::{self, WifiCredentials};
use greenhouse::app::service::AppService;
use greenhouse::config::SystemConfig;
use greenhouse::drivers::fan::FanDriver;
use greenhouse::drivers::hw_init::{self, GpioOut, OpenDrainPin};
use greenhouse::drivers::irrigation::IrrigationValve;
use greenhouse::drivers::zero_cross::{self, GpTimer, PhaseControl, TriacDriver, TriacTiming};
use greenhouse::drivers::hw_timer;
use greenhouse::events::{self, Event};
use greenhouse::pins;
use greenhouse::sensors::ClimateSensors;
use greenhouse::sensors::am2302::{self, Am2302};
use greenhouse::sensors::lm35::Lm35;

/// Main-loop idle period between queue drains.
const LOOP_IDLE_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Greenhouse node v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;

    // ── 2. Peripherals ────────────────────────────────────────
    // Output pins, the sensor line and the fan PWM are required.
    hw_init::init_peripherals()?;
    let isr_ready = match hw_init::init_isr_service() {
        Ok(()) => true,
        Err(e) => {
            error!("ISR service init failed: {} (dimmer disabled)", e);
            false
        }
    };
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    // ── 3. Sensors ────────────────────────────────────────────
    FreeRtos::delay_ms(am2302::POWER_UP_DELAY_MS);
    let mut dht = Am2302::new(OpenDrainPin::new(pins::AM2302_DATA_GPIO), SystemPulseClock::new());
    let climate = match dht.init_device() {
        Ok(r) => {
            info!("AM2302 initialized ({:.1} C, {:.1} %)", r.temperature, r.humidity);
            Some(dht)
        }
        Err(e) => {
            error!("AM2302 init failed: {} (sampling disabled)", e);
            None
        }
    };
    let probe = match hw_init::init_adc() {
        Ok(()) => {
            info!("LM35 initialized");
            Some(Lm35::new(AdcChannel::new(pins::LM35_ADC1_CHANNEL)))
        }
        Err(e) => {
            error!("ADC init failed: {} (probe disabled)", e);
            None
        }
    };
    let mut sensors = ClimateSensors::new(climate, probe);

    // ── 4. Zero-cross dimmer ──────────────────────────────────
    // Shared with the interrupt handlers for the life of the program.
    let phase: &'static PhaseControl = Box::leak(Box::new(PhaseControl::new(config.power_curve())));
    if isr_ready {
        let driver = Box::leak(Box::new(TriacDriver::new(
            phase,
            GpTimer::default(),
            GpioOut::new(pins::TRIAC_GATE_GPIO),
            GpioOut::new(pins::ZERO_CROSS_LED_GPIO),
            Ets,
            TriacTiming::from_config(&config),
        )));
        if let Err(e) = zero_cross::start(driver) {
            error!("Dimmer init failed: {} (bulb control disabled)", e);
        }
    }
    let mut hw = HardwareAdapter::new(phase, FanDriver::new(), IrrigationValve::new());

    // ── 5. Network ────────────────────────────────────────────
    let mut link = TcpLink::new(&config.server_addr)?;
    let station = match WifiCredentials::from_build_env()
        .and_then(|creds| wifi::connect_station(peripherals.modem, sysloop, nvs, &creds))
    {
        Ok(station) => Some(station),
        Err(e) => {
            warn!("WiFi unavailable: {} (running offline)", e);
            None
        }
    };

    // ── 6. Application core ───────────────────────────────────
    let mut log_sink = LogEventSink::new();
    let mut display = LogDisplay::new();
    let time = Esp32TimeAdapter::new();
    let mut app = AppService::new(config.clone());

    if station.is_some() && link.connect().is_ok() {
        app.set_link_up(true);
    }
    app.start(&sensors, &hw, &mut log_sink);

    hw_timer::start_timers(&config);
    info!("System ready. Entering event loop.");

    loop {
        events::drain_events(|event| match event {
            Event::ControlTick => {
                app.on_control_tick(&sensors, &mut hw, time.uptime_us(), &mut log_sink);
            }
            Event::SensorReadTick => app.on_sensor_tick(&mut sensors, &mut log_sink),
            Event::ProbeReadTick => app.on_probe_tick(&mut sensors, &mut log_sink),
            Event::CommandPollTick => app.poll_commands(&mut link, &mut hw, &mut log_sink),
            Event::TelemetryTick => app.send_telemetry(&sensors, &mut link, &mut log_sink),
            Event::DisplayTick => app.on_display_tick(&sensors, &mut display, &mut log_sink),
        });
        FreeRtos::delay_ms(LOOP_IDLE_MS);
    }
}
