//! End-to-end session flows: press → breath episode → verdict → outcome.
//!
//! Drives the real service, FSM, sampler, and scheduler over the simulated
//! timer; only the display and headlight pin are host stand-ins.

use crate::mock_hw::{EVAL_TICKS, Rig, TICKS_PER_SEC, sensitive_config};

use interlock::app::events::AppEvent;
use interlock::app::ports::TimerControl;
use interlock::app::shared::SharedInterlock;
use interlock::control::bac::Verdict;
use interlock::error::FaultKind;
use interlock::fsm::StateId;
use interlock::scheduler::Channel;

// ── Pass path ─────────────────────────────────────────────────

#[test]
fn welcome_screen_after_start() {
    let rig = Rig::with_defaults();
    assert_eq!(rig.state(), StateId::Idle);
    assert_eq!(rig.line(0), "HELLO JULIA!");
    assert_eq!(rig.line(1), "PUSH TO START");
    assert_eq!(rig.sink.events, vec![AppEvent::Started(StateId::Idle)]);
}

#[test]
fn only_the_evaluation_firing_produces_a_result() {
    let mut rig = Rig::with_defaults();
    rig.set_sensor(1800);
    assert_eq!(rig.press(), StateId::AwaitingBreath);
    assert_eq!(rig.line(0), "BLOW 5 TIMES...");

    rig.run_for(EVAL_TICKS - 1);
    assert_eq!(rig.state(), StateId::AwaitingBreath);
    assert_eq!(rig.sink.evaluations(), 0);

    rig.run_for(1);
    assert_eq!(rig.state(), StateId::EngineEnabled);
    assert_eq!(rig.sink.evaluations(), 1);
    assert_eq!(rig.service.attempts(), 1);
}

#[test]
fn sober_breath_enables_engine_then_shutdown() {
    let mut rig = Rig::with_defaults();
    rig.set_sensor(1800);
    rig.press();
    rig.run_episode();

    assert_eq!(rig.line(0), "BAC LEVEL: 0.00%");
    assert_eq!(rig.line(1), "DRIVE SAFE!");
    let reading = rig.service.reading().expect("latched reading");
    assert_eq!(reading.verdict, Verdict::Pass);
    assert_eq!(rig.state(), StateId::EngineEnabled);
    assert!(rig.service.is_enabled());
    assert_eq!(
        rig.sink.transitions().last(),
        Some(&(StateId::AwaitingBreath, StateId::EngineEnabled))
    );

    // The lamps come up on the next PWM firing.
    assert!(!rig.hw.headlights_on());
    rig.run_for(15_000);
    assert!(rig.hw.headlights_on());

    rig.run_for(TICKS_PER_SEC / 100);
    assert_eq!(rig.press(), StateId::Shutdown);
    assert!(!rig.service.is_enabled());
    assert!(!rig.hw.headlights_on());
    assert_eq!(rig.line(0), "YOU HAVE ARRIVED");
    assert_eq!(rig.line(1), "SAFELY. GOODBYE!");
    assert!(!rig.service.evaluation_armed());

    // PWM keeps firing but holds the lamps low.
    rig.run_for(TICKS_PER_SEC / 100);
    assert!(!rig.hw.headlights_on());
    assert_eq!(rig.state(), StateId::Shutdown);
}

#[test]
fn reference_calibration_never_fails() {
    let mut rig = Rig::with_defaults();
    rig.set_sensor(4095);
    rig.press();
    rig.run_episode();
    let reading = rig.service.reading().expect("latched reading");
    assert_eq!(reading.bac, 0);
    assert_eq!(reading.verdict, Verdict::Pass);
}

// ── Fail / lockout path ───────────────────────────────────────

#[test]
fn three_failed_episodes_lock_out() {
    let mut rig = Rig::new(sensitive_config());
    rig.set_sensor(4095);

    // Episode 1: odd press.
    rig.press();
    rig.run_episode();
    assert_eq!(rig.state(), StateId::ResultReady);
    assert_eq!(rig.line(0), "BAC LEVEL: 0.83%");
    assert_eq!(rig.line(1), "TOO HIGH");
    assert_eq!(rig.service.attempts(), 1);

    // A failed result never enables, however long we wait.
    rig.run_for(TICKS_PER_SEC);
    assert_eq!(rig.state(), StateId::ResultReady);
    assert!(!rig.hw.headlights_on());

    // Episode 2: even press retries.
    assert_eq!(rig.press(), StateId::AwaitingBreath);
    assert_eq!(rig.line(0), "TRY AGAIN");
    assert_eq!(rig.line(1), "BLOW 5 TIMES...");
    rig.run_episode();
    assert_eq!(rig.service.attempts(), 2);

    // Episode 3: odd press starts afresh.
    assert_eq!(rig.press(), StateId::AwaitingBreath);
    assert_eq!(rig.line(0), "BLOW 5 TIMES...");
    rig.run_episode();
    assert_eq!(rig.service.attempts(), 3);

    // Even press with no attempts left.
    assert_eq!(rig.press(), StateId::LockedOut);
    assert_eq!(rig.line(0), "CALL AN UBER OR");
    assert_eq!(rig.line(1), "#TAXI (#8294)");
    assert!(!rig.service.evaluation_armed());
    assert_eq!(rig.sink.evaluations(), 3);
}

#[test]
fn odd_press_after_lockout_starts_a_new_episode_without_resetting_attempts() {
    let mut rig = Rig::new(sensitive_config());
    rig.set_sensor(4095);
    for _ in 0..3 {
        rig.press();
        rig.run_episode();
    }
    assert_eq!(rig.press(), StateId::LockedOut);

    assert_eq!(rig.press(), StateId::AwaitingBreath);
    rig.run_episode();
    assert_eq!(rig.state(), StateId::ResultReady);
    assert_eq!(rig.service.attempts(), 3);

    assert_eq!(rig.press(), StateId::LockedOut);
}

#[test]
fn sober_retry_after_failure_enables() {
    let mut rig = Rig::new(sensitive_config());
    rig.set_sensor(4095);
    rig.press();
    rig.run_episode();
    assert_eq!(rig.service.reading().map(|r| r.verdict), Some(Verdict::Fail));

    rig.set_sensor(1000);
    rig.press();
    rig.run_episode();
    assert_eq!(rig.state(), StateId::EngineEnabled);
    assert_eq!(rig.service.attempts(), 2);
}

#[test]
fn pass_on_the_last_attempt_then_immediate_press_shuts_down() {
    let mut rig = Rig::new(sensitive_config());
    rig.set_sensor(4095);
    rig.press();
    rig.run_episode();
    rig.press();
    rig.run_episode();
    assert_eq!(rig.service.attempts(), 2);

    rig.set_sensor(1000);
    rig.press();
    // Stop on the evaluation firing and press before any further timer
    // activity.
    rig.run_episode();
    assert_eq!(rig.service.attempts(), 3);
    assert_eq!(rig.service.reading().map(|r| r.verdict), Some(Verdict::Pass));

    assert_eq!(rig.press(), StateId::Shutdown);
    assert_eq!(rig.line(0), "YOU HAVE ARRIVED");
}

// ── Restarts ──────────────────────────────────────────────────

#[test]
fn retry_restarts_the_evaluation_delay() {
    let mut rig = Rig::with_defaults();
    rig.press();
    rig.run_for(EVAL_TICKS - TICKS_PER_SEC);

    // Even press while awaiting: retry, delay re-armed from now.
    assert_eq!(rig.press(), StateId::AwaitingBreath);
    rig.run_for(EVAL_TICKS - 1);
    assert_eq!(rig.state(), StateId::AwaitingBreath);
    rig.run_for(1);
    assert_eq!(rig.state(), StateId::EngineEnabled);
}

#[test]
fn odd_press_while_enabled_disables_and_restarts() {
    let mut rig = Rig::with_defaults();
    rig.press();
    // Even press retries before any result, so the pass lands on an even count.
    rig.press();
    rig.run_episode();
    rig.run_for(15_000);
    assert_eq!(rig.state(), StateId::EngineEnabled);
    assert!(rig.hw.headlights_on());

    assert_eq!(rig.press(), StateId::AwaitingBreath);
    assert!(!rig.service.is_enabled());
    assert!(!rig.hw.headlights_on());
    assert!(rig.service.reading().is_none());
    assert!(rig.service.evaluation_armed());
    assert_eq!(rig.line(0), "BLOW 5 TIMES...");
}

#[test]
fn new_test_after_shutdown_rearms_episode() {
    let mut rig = Rig::with_defaults();
    rig.press();
    rig.run_episode();
    rig.run_for(15_000);
    assert_eq!(rig.press(), StateId::Shutdown);

    assert_eq!(rig.press(), StateId::AwaitingBreath);
    assert!(rig.service.evaluation_armed());
    rig.run_episode();
    assert_eq!(rig.state(), StateId::EngineEnabled);
    assert_eq!(rig.service.attempts(), 2);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn saturated_sensor_faults_are_logged_and_ignored() {
    let mut rig = Rig::with_defaults();
    rig.set_sensor(5000);
    rig.press();
    rig.run_episode();

    // Faulted conversions store zero, which reads as sober.
    assert_eq!(rig.state(), StateId::EngineEnabled);
    assert!(rig.service.fault_count(FaultKind::Sensor) >= 3);
    assert!(rig.sink.faults() >= 3);
    assert_eq!(rig.service.fault_count(FaultKind::TimerMisconfiguration), 0);
}

#[test]
fn lockout_with_an_evaluation_expiry_in_flight_never_refires() {
    let mut rig = Rig::new(sensitive_config());
    rig.set_sensor(4095);
    for _ in 0..3 {
        rig.press();
        rig.run_episode();
    }

    // Let the evaluation channel expire again without servicing it.
    for _ in 0..100_000 {
        if rig.hw.timer().pending().contains(Channel::EvaluationDelay) {
            break;
        }
        rig.hw.timer_mut().step(u32::MAX);
    }
    assert!(rig.hw.timer().pending().contains(Channel::EvaluationDelay));

    assert_eq!(rig.press(), StateId::LockedOut);
    assert!(!rig.hw.timer().counter(Channel::EvaluationDelay).is_armed());
    rig.run_for(3 * EVAL_TICKS);

    assert_eq!(rig.state(), StateId::LockedOut);
    assert_eq!(rig.service.fault_count(FaultKind::TimerMisconfiguration), 0);
    assert_eq!(rig.sink.evaluations(), 3);
}

// ── Shared slot ───────────────────────────────────────────────

#[test]
fn shared_slot_drives_a_full_session() {
    let Rig {
        service,
        hw,
        mut sink,
        ..
    } = Rig::with_defaults();

    let shared = SharedInterlock::new();
    shared.install(service, hw);

    shared.with(|svc, hw| svc.on_button_press(hw, &mut sink));
    let mut elapsed = 0;
    while elapsed < EVAL_TICKS + 15_000 {
        elapsed += u64::from(
            shared
                .with(|svc, hw| {
                    let advanced = hw.timer_mut().step(u32::MAX);
                    svc.poll_timers(hw, &mut sink);
                    svc.background_step();
                    advanced
                })
                .expect("installed"),
        );
    }

    assert_eq!(shared.with(|svc, _| svc.state()), Some(StateId::EngineEnabled));
    assert_eq!(
        shared.with(|svc, hw| svc.on_button_press(hw, &mut sink)),
        Some(StateId::Shutdown)
    );
}
