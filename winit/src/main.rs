// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use incubator_dashboard_common::telemetry::{self, TelemetrySourcePointer};
use incubator_dashboard_common::BrokerConfig;
use incubator_dashboard_model::{IncubatorData, Status, HUMIDITY, TEMPERATURE};

/// Our App struct that holds the UI and the telemetry source.
///
/// The source fills a snapshot from its own thread; a timer on the UI thread
/// polls it and pushes every new snapshot into the `ViewModel` global.
struct App {
    ui: AppWindow,
    source: std::rc::Rc<std::cell::RefCell<TelemetrySourcePointer>>,
    timer: slint::Timer,
}

impl App {
    const TIMER_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

    /// Create the window and open the telemetry source described by `config`.
    fn new(config: &BrokerConfig) -> anyhow::Result<Self> {
        let ui = AppWindow::new()?;

        let source = telemetry::open(config)?;
        log::info!("Receiving telemetry from {}", source.describe());

        // Show the empty record until the first message arrives.
        let model = ui.global::<ViewModel>();
        model.set_incubator(IncubatorData::default().into());
        model.set_ideal_temperature(slint::format!(
            "Ideal temperature: {:.1}°C - {:.1}°C",
            TEMPERATURE.ideal_min,
            TEMPERATURE.ideal_max
        ));
        model.set_ideal_humidity(slint::format!(
            "Ideal humidity: {:.0}% - {:.0}%",
            HUMIDITY.ideal_min,
            HUMIDITY.ideal_max
        ));

        Ok(Self {
            ui,
            source: std::rc::Rc::new(std::cell::RefCell::new(source)),
            timer: slint::Timer::default(),
        })
    }

    /// Run the App: start polling the source, then hand control to the UI.
    fn run(&mut self) -> anyhow::Result<()> {
        let ui_handle = self.ui.as_weak();
        let source = self.source.clone();

        self.timer.start(
            slint::TimerMode::Repeated,
            Self::TIMER_INTERVAL,
            move || {
                let Some(ui) = ui_handle.upgrade() else {
                    return;
                };

                let Some(data) = source.borrow_mut().poll() else {
                    return;
                };

                if data.temperature_status().is_critical() || data.humidity_status().is_critical() {
                    log::warn!(
                        "Incubator out of range: temperature {} ({}), humidity {} ({})",
                        data.temperature,
                        data.temperature_status(),
                        data.humidity,
                        data.humidity_status()
                    );
                }

                let model = ui.global::<ViewModel>();
                model.set_incubator(data.into());
                model.set_have_data(true);
            },
        );

        // Run the UI (and map an error to an anyhow::Error).
        self.ui.run().map_err(|e| e.into())
    }
}

impl From<Status> for ReadingStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::CriticalLow => ReadingStatus::CriticalLow,
            Status::Low => ReadingStatus::Low,
            Status::Ideal => ReadingStatus::Ideal,
            Status::High => ReadingStatus::High,
            Status::CriticalHigh => ReadingStatus::CriticalHigh,
        }
    }
}

/// Convert an incubator snapshot into the record shown by the UI.
impl From<IncubatorData> for IncubatorRecord {
    fn from(data: IncubatorData) -> Self {
        let temperature_status = data.temperature_status();
        let humidity_status = data.humidity_status();

        Self {
            temperature_text: slint::format!("{:.1}", data.temperature),
            temperature_status: temperature_status.into(),
            temperature_label: slint::SharedString::from(temperature_status.label()),
            humidity_text: slint::format!("{:.1}", data.humidity),
            humidity_status: humidity_status.into(),
            humidity_label: slint::SharedString::from(humidity_status.label()),
            heater_on: data.heater_on,
            humidifier_on: data.humidifier_on,
            connected: data.connected,
            current_day: clamp_to_i32(data.current_day),
            days_remaining: clamp_to_i32(data.days_remaining),
            total_days: clamp_to_i32(data.total_days()),
            progress: data.progress(),
            progress_percent: clamp_to_i32(data.progress_percent()),
            // Set current system time as the timestamp
            timestamp: slint::SharedString::from(chrono::Local::now().format("%H:%M:%S").to_string()),
        }
    }
}

fn clamp_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// A minimal main function that loads the configuration, initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = BrokerConfig::from_env()?;
    let mut app = App::new(&config)?;

    app.run()
}

#[test]
fn test_record_from_incubator_data() {
    let record: IncubatorRecord = IncubatorData {
        temperature: 37.84,
        humidity: 41.27,
        heater_on: true,
        humidifier_on: false,
        connected: true,
        current_day: 10,
        days_remaining: 11,
    }
    .into();

    assert_eq!(record.temperature_text, "37.8");
    assert_eq!(record.temperature_status, ReadingStatus::Ideal);
    assert_eq!(record.humidity_text, "41.3");
    assert_eq!(record.humidity_status, ReadingStatus::Low);
    assert_eq!(record.humidity_label, "below ideal");
    assert!(record.heater_on);
    assert!(record.connected);
    assert_eq!(record.total_days, 21);
    assert_eq!(record.progress_percent, 47);
    assert!(!record.timestamp.is_empty());
}

#[test]
fn test_record_for_empty_cycle() {
    let record: IncubatorRecord = IncubatorData::default().into();

    assert_eq!(record.temperature_text, "0.0");
    assert_eq!(record.temperature_status, ReadingStatus::CriticalLow);
    assert_eq!(record.progress, 0.0);
    assert_eq!(record.progress_percent, 0);
    assert!(!record.connected);
}

#[test]
fn test_large_day_counts_saturate() {
    assert_eq!(clamp_to_i32(u32::MAX), i32::MAX);
    assert_eq!(clamp_to_i32(21), 21);
}
