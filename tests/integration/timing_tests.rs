//! Timer-level behaviour: headlight PWM shape, evaluation phase, and the
//! sample clock cadence, all measured on the simulated timer.

use crate::mock_hw::{EVAL_TICKS, Rig, TICKS_PER_SEC, sensitive_config};
use interlock::scheduler::Channel;

use interlock::config::InterlockConfig;
use interlock::fsm::StateId;

fn enabled_rig() -> Rig {
    let mut rig = Rig::with_defaults();
    rig.press();
    rig.run_episode();
    rig.run_for(15_000);
    assert_eq!(rig.state(), StateId::EngineEnabled);
    rig
}

#[test]
fn steady_state_pwm_matches_duty_factor() {
    let mut rig = enabled_rig();
    rig.run_for(TICKS_PER_SEC / 100);

    let runs = rig.runs();
    // First high run is the initial half-period transient.
    assert_eq!(runs[0], (true, 15_000));
    assert_eq!(runs[1], (false, 24_000));

    let steady = &runs[2..];
    assert!(steady.len() > 10);
    for &(level, len) in steady {
        let expected = if level { 6_000 } else { 24_000 };
        assert_eq!(len, expected, "run {:?}", (level, len));
    }
}

#[test]
fn pwm_period_is_configurable() {
    let config = InterlockConfig {
        pwm_period_ticks: 10_000,
        pwm_duty_factor: 0.5,
        ..InterlockConfig::default()
    };
    let mut rig = Rig::new(config);
    rig.press();
    rig.run_episode();
    rig.run_for(5_000);
    assert_eq!(rig.state(), StateId::EngineEnabled);
    rig.run_for(100_000);

    for &(_, len) in &rig.runs()[1..] {
        assert_eq!(len, 5_000);
    }
}

#[test]
fn indicator_stays_low_until_enabled() {
    let mut rig = Rig::with_defaults();
    rig.press();
    rig.run_for(EVAL_TICKS - 1);
    assert!(rig.edges.is_empty());
    assert!(!rig.hw.headlights_on());
}

#[test]
fn failed_result_never_drives_indicator() {
    let mut rig = Rig::new(sensitive_config());
    rig.set_sensor(4095);
    rig.press();
    rig.run_episode();
    rig.run_for(TICKS_PER_SEC);
    assert!(rig.edges.is_empty());
}

#[test]
fn shutdown_holds_indicator_low_while_pwm_runs() {
    let mut rig = enabled_rig();
    rig.run_for(100_000);
    rig.press();
    let edges_at_shutdown = rig.edges.len();
    rig.run_for(TICKS_PER_SEC / 10);

    assert_eq!(rig.edges.len(), edges_at_shutdown);
    assert!(!rig.hw.headlights_on());
    assert!(rig.hw.timer().counter(Channel::Pwm).is_armed());
}

#[test]
fn evaluation_channel_repeats_while_enabled_without_reevaluating() {
    let mut rig = enabled_rig();
    rig.run_for(3 * EVAL_TICKS);
    assert_eq!(rig.state(), StateId::EngineEnabled);
    assert_eq!(rig.sink.evaluations(), 1);
    assert_eq!(rig.service.attempts(), 1);
}

#[test]
fn sample_clock_advances_cursor_once_per_period() {
    let mut rig = Rig::with_defaults();
    rig.set_sensor(3000);
    rig.press();
    rig.run_for(3 * TICKS_PER_SEC);

    let buffer = rig.service.sample_buffer();
    assert_eq!(buffer.cursor(), 3);
    assert_eq!(&buffer.as_slice()[..4], &[3000, 3000, 3000, 0]);
    assert_eq!(rig.service.average(), 900);
}

#[test]
fn restart_rewinds_cursor_and_keeps_contents() {
    let mut rig = Rig::with_defaults();
    rig.set_sensor(3000);
    rig.press();
    rig.run_for(3 * TICKS_PER_SEC);

    rig.set_sensor(2000);
    rig.press();
    assert_eq!(rig.service.sample_buffer().cursor(), 0);
    rig.run_for(TICKS_PER_SEC);

    let buffer = rig.service.sample_buffer();
    assert_eq!(buffer.cursor(), 1);
    assert_eq!(&buffer.as_slice()[..3], &[2000, 3000, 3000]);
}

#[test]
fn averager_tracks_buffer_mean_at_every_step() {
    let mut rig = Rig::new(sensitive_config());
    for (i, raw) in [0u16, 4095, 1234, 3333, 2050].into_iter().enumerate() {
        rig.set_sensor(raw);
        if i == 0 {
            rig.press();
        }
        rig.run_for(TICKS_PER_SEC / 10);
        let buffer = rig.service.sample_buffer();
        let sum: u32 = buffer.as_slice().iter().map(|&v| u32::from(v)).sum();
        assert_eq!(u32::from(rig.service.average()), sum / buffer.as_slice().len() as u32);
    }
}

// ── Loop-paced servicing ──────────────────────────────────────

#[test]
fn pwm_keeps_its_duty_under_a_one_millisecond_loop() {
    let mut rig = enabled_rig();
    rig.run_for(TICKS_PER_SEC / 100);
    let before = rig.edges.len();
    rig.run_loop_passes(1000);

    let edges = &rig.edges[before..];
    // Two edges per 1 ms period, for one second.
    assert!((1999..=2001).contains(&edges.len()), "{} edges", edges.len());

    let mut high = 0;
    let mut total = 0;
    for w in edges.windows(2) {
        let len = w[1].0 - w[0].0;
        let expected = if w[0].1 { 6_000 } else { 24_000 };
        assert_eq!(len, expected, "run starting at {}", w[0].0);
        if w[0].1 {
            high += len;
        }
        total += len;
    }
    // 20 % duty.
    assert!((high * 100 / total).abs_diff(20) <= 1, "{high}/{total}");
}

#[test]
fn full_session_under_the_firmware_loop() {
    let mut rig = Rig::with_defaults();
    rig.set_sensor(3000);
    rig.press();
    rig.run_loop_passes(3000);
    assert_eq!(rig.service.sample_buffer().cursor(), 3);
    assert_eq!(rig.state(), StateId::AwaitingBreath);

    rig.run_loop_passes(1000);
    assert_eq!(rig.state(), StateId::EngineEnabled);
    rig.run_loop_passes(10);
    assert!(rig.edges.len() >= 10);
    assert_eq!(rig.press(), StateId::Shutdown);
}

#[test]
fn board_config_ticks_the_rtos_every_millisecond() {
    let sdkconfig = include_str!("../../sdkconfig.defaults");
    assert!(sdkconfig.lines().any(|l| l.trim() == "CONFIG_FREERTOS_HZ=1000"));

    let manifest = include_str!("../../Cargo.toml");
    assert!(manifest.contains(r#"esp_idf_sdkconfig_defaults = ["sdkconfig.defaults"]"#));
}
