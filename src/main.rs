#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use core::sync::atomic::Ordering;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::rtc_cntl::{Rtc, RwdtStage};
use esp_hal::timer::timg::TimerGroup;
use esp_hal::twai::{TwaiConfiguration, TwaiMode};
use static_cell::StaticCell;

use can_analog_node_firmware::bus::{resolve_address, resolve_speed_profile, Dispatcher};
use can_analog_node_firmware::config::{flash_layout, system};
use can_analog_node_firmware::hardware::{
    baud_rate, AnalogInputs, BootJumpers, ConfigFlash, SoftwareReset, TwaiBus,
};
use can_analog_node_firmware::settings::ConfigStore;
use can_analog_node_firmware::tasks::{
    can::can_task, sampler::sampler_task, tx::tx_task, SAMPLE_RATE, STATS_DUE, TX_CHANNEL,
};

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

#[esp_hal::main]
fn main() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_println::logger::init_logger_from_env();

    // Sample the strap jumpers before the scheduler starts so the pull-ups
    // have settled and nothing preempts the read
    let jumpers = BootJumpers::new(
        Input::new(
            peripherals.GPIO4,
            InputConfig::default().with_pull(Pull::Up),
        ),
        Input::new(
            peripherals.GPIO5,
            InputConfig::default().with_pull(Pull::Up),
        ),
        Input::new(
            peripherals.GPIO6,
            InputConfig::default().with_pull(Pull::Up),
        ),
    );
    let address = resolve_address(&jumpers);
    let profile = resolve_speed_profile(&jumpers);

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let twai = TwaiConfiguration::new(
        peripherals.TWAI0,
        peripherals.GPIO10,
        peripherals.GPIO9,
        baud_rate(profile),
        TwaiMode::Normal,
    )
    .into_async()
    .start();
    let (twai_rx, twai_tx) = twai.split();

    let mut adc_config = AdcConfig::new();
    let ch0 = adc_config.enable_pin(peripherals.GPIO1, Attenuation::_11dB);
    let ch1 = adc_config.enable_pin(peripherals.GPIO2, Attenuation::_11dB);
    let ch2 = adc_config.enable_pin(peripherals.GPIO3, Attenuation::_11dB);
    let ch3 = adc_config.enable_pin(peripherals.GPIO7, Attenuation::_11dB);
    let adc = Adc::new(peripherals.ADC1, adc_config);
    let inputs = AnalogInputs::new(adc, ch0, ch1, ch2, ch3);

    let mut store = ConfigStore::new(
        ConfigFlash::new(),
        flash_layout::CONFIG_REGION_OFFSET,
        &SAMPLE_RATE,
    );
    store.load();

    let dispatcher = Dispatcher::new(
        TwaiBus::new(twai_rx, TX_CHANNEL.sender()),
        SoftwareReset,
        store,
        address,
    );

    // Hardware watchdog, fed by the supervisor loop
    let mut rtc = Rtc::new(peripherals.LPWR);
    rtc.rwdt.set_timeout(
        RwdtStage::Stage0,
        esp_hal::time::Duration::from_millis(system::WATCHDOG_TIMEOUT_MS),
    );
    rtc.rwdt.enable();

    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(
            spawner,
            dispatcher,
            profile,
            twai_tx,
            inputs,
            address.base_id(),
            rtc,
        ));
    })
}

#[embassy_executor::task]
async fn async_main(
    spawner: Spawner,
    dispatcher: Dispatcher<
        'static,
        TwaiBus<'static>,
        SoftwareReset,
        ConfigFlash,
    >,
    profile: can_analog_node_firmware::bus::SpeedProfile,
    twai_tx: esp_hal::twai::TwaiTx<'static, esp_hal::Async>,
    inputs: AnalogInputs<'static>,
    base_id: u32,
    mut rtc: Rtc<'static>,
) {
    spawner.must_spawn(tx_task(twai_tx));
    spawner.must_spawn(can_task(dispatcher, profile));
    spawner.must_spawn(sampler_task(inputs, base_id));

    // Supervisor: feed the watchdog and pace the stats broadcast
    let mut since_stats_ms: u64 = 0;
    loop {
        Timer::after(Duration::from_millis(system::CHECK_INTERVAL_MS)).await;
        rtc.rwdt.feed();

        since_stats_ms += system::CHECK_INTERVAL_MS;
        if since_stats_ms >= system::STATS_INTERVAL_MS {
            since_stats_ms = 0;
            STATS_DUE.store(true, Ordering::Relaxed);
        }
    }
}
