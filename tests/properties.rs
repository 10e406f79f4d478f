use proptest::prelude::*;
use steam_boiler_control::{
    BoilerConfig, BoilerPlant, Mailbox, Message, Mode, PumpFault, SensorFault,
    SteamBoilerController,
};

fn arb_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        (-50.0..1200.0f64).prop_map(Message::Level),
        (-5.0..80.0f64).prop_map(Message::Steam),
        (0..3usize, any::<bool>()).prop_map(|(pump, open)| Message::PumpState { pump, open }),
        (0..3usize, any::<bool>())
            .prop_map(|(pump, flowing)| Message::PumpControlState { pump, flowing }),
        Just(Message::SteamBoilerWaiting),
        Just(Message::PhysicalUnitsReady),
        (0..3usize).prop_map(Message::PumpRepaired),
        (0..3usize).prop_map(Message::PumpControlRepaired),
        Just(Message::SteamRepaired),
        Just(Message::LevelRepaired),
        (0..3usize).prop_map(Message::PumpFailureAcknowledgement),
        Just(Message::SteamOutcomeFailureAcknowledgement),
        Just(Message::LevelFailureAcknowledgement),
    ]
}

fn arb_batch() -> impl Strategy<Value = Mailbox> {
    prop_oneof![
        // well-formed readings with random notifications
        (
            0.0..1000.0f64,
            0.0..50.0f64,
            any::<[bool; 2]>(),
            proptest::collection::vec(arb_message(), 0..4),
        )
            .prop_map(|(level, steam, pumps, extra)| {
                let mut b = Mailbox::with_readings(level, steam, &pumps, &pumps);
                b.extend(extra);
                b
            }),
        // anything at all
        proptest::collection::vec(arb_message(), 0..12)
            .prop_map(|msgs| msgs.into_iter().collect::<Mailbox>()),
    ]
}

/// Drives the controller against the plant for `ticks` cycles, injecting one
/// fault half way, so the controller can end up in any reachable mode.
fn reached(ticks: usize, fault: u8, start: f64) -> SteamBoilerController {
    let cfg = BoilerConfig::default();
    let mut c = SteamBoilerController::new(cfg.clone()).unwrap();
    let mut plant = BoilerPlant::new(cfg, start, 11);
    for t in 0..ticks {
        if t == ticks / 2 {
            match fault {
                0 => plant.fail_level_sensor(SensorFault::Stuck { value: -1.0 }),
                1 => plant.fail_steam_sensor(SensorFault::Stuck { value: 75.0 }),
                2 => plant.fail_pump(0, PumpFault::StuckClosed),
                3 => plant.fail_pump(1, PumpFault::ControllerLies),
                _ => {}
            }
        }
        let out = c.tick(&plant.inbound());
        plant.apply(&out);
    }
    c
}

proptest! {
    #[test]
    fn emergency_stop_is_absorbing(batches in proptest::collection::vec(arb_batch(), 1..40)) {
        let mut c = SteamBoilerController::new(BoilerConfig::default()).unwrap();
        c.tick(&Mailbox::new());
        prop_assert_eq!(c.mode(), Mode::EmergencyStop);

        for batch in batches {
            let out = c.tick(&batch);
            prop_assert_eq!(c.mode(), Mode::EmergencyStop);
            prop_assert!(
                out.iter().all(|m| *m == Message::Mode(Mode::EmergencyStop)),
                "stopped controller sent {:?}", out
            );
        }
    }

    #[test]
    fn wrong_pump_count_always_stops(
        ticks in 0..80usize,
        fault in 0..5u8,
        start in 150.0..850.0f64,
        count in prop_oneof![Just(0usize), Just(1), Just(3), Just(4)],
        level in 0.0..1000.0f64,
    ) {
        let mut c = reached(ticks, fault, start);
        let pumps = vec![false; count];
        let mut batch = Mailbox::with_readings(level, 0.0, &pumps, &[false, false]);
        batch.send(Message::PhysicalUnitsReady);

        let out = c.tick(&batch);
        prop_assert_eq!(c.mode(), Mode::EmergencyStop);
        prop_assert!(out.contains(&Message::Mode(Mode::EmergencyStop)));
    }
}
