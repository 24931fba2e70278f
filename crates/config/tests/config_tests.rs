// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_irqc_config::{
    load_scenario, Action, PhonyLine, RaiseLine, Scenario, ScenarioAssertion, StopReason,
};

const FULL: &str = r#"
schema_version: "1.0"
name: "uart-and-timer"
description: "Timer preempted by a UART line"
controller:
  priorities:
    - line: 3
      priority: 10
    - line: 7
      priority: 2
  enabled: [3, 7]
  locked: false
sources:
  - id: "timer0"
    line: 3
    start: 100
    period: 50
    count: 4
firmware:
  - at: 10
    action: set_priority
    line: 5
    priority: 1
  - at: 20
    action: raise
    line: phony_hard
  - at: 30
    action: lock
  - at: 40
    action: raise_now
    line: 9
handlers:
  3:
    - action: raise
      line: 7
    - action: clear_all_enabled
limits:
  max_time: 10000
  max_events: 500
assertions:
  - delivered_count:
      line: 3
      count: 4
  - delivery_order: [3, 7]
  - latched_at_end:
      line: 5
      latched: false
  - expected_stop_reason: idle
"#;

#[test]
fn test_full_scenario_parses() {
    let s = Scenario::from_yaml(FULL).unwrap();
    assert_eq!(s.name, "uart-and-timer");
    assert_eq!(s.controller.priorities.len(), 2);
    assert_eq!(s.controller.enabled, vec![3, 7]);

    assert_eq!(s.sources[0].period, Some(50));
    assert_eq!(s.sources[0].count, Some(4));

    assert_eq!(s.firmware.len(), 4);
    assert_eq!(s.firmware[0].at, 10);
    assert_eq!(
        s.firmware[0].action,
        Action::SetPriority {
            line: 5,
            priority: 1
        }
    );
    assert_eq!(
        s.firmware[1].action,
        Action::Raise {
            line: RaiseLine::Phony(PhonyLine::PhonyHard)
        }
    );
    assert_eq!(s.firmware[2].action, Action::Lock);
    assert_eq!(
        s.firmware[3].action,
        Action::RaiseNow {
            line: RaiseLine::Line(9)
        }
    );
    assert_eq!(s.firmware[3].action.line(), Some(9));

    let handler = &s.handlers[&3];
    assert_eq!(
        handler[0],
        Action::Raise {
            line: RaiseLine::Line(7)
        }
    );
    assert_eq!(handler[1], Action::ClearAllEnabled);

    assert_eq!(s.limits.max_time, 10000);
    assert_eq!(s.assertions.len(), 4);
    assert!(matches!(
        &s.assertions[1],
        ScenarioAssertion::DeliveryOrder(a) if a.delivery_order == vec![3, 7]
    ));
    assert!(matches!(
        &s.assertions[3],
        ScenarioAssertion::ExpectedStopReason(a) if a.expected_stop_reason == StopReason::Idle
    ));
}

#[test]
fn test_out_of_range_line_rejected() {
    let yaml = r#"
name: "oob"
firmware:
  - at: 0
    action: enable
    line: 64
"#;
    let err = Scenario::from_yaml(yaml).unwrap_err();
    assert!(format!("{:#}", err).contains("line 64"));
}

#[test]
fn test_out_of_range_handler_key_rejected() {
    let yaml = r#"
name: "oob-handler"
handlers:
  99:
    - action: unlock
"#;
    assert!(Scenario::from_yaml(yaml).is_err());
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = r#"
name: "typo"
controller:
  lockd: true
"#;
    assert!(Scenario::from_yaml(yaml).is_err());
}

#[test]
fn test_zero_limit_rejected() {
    let yaml = r#"
name: "no-time"
limits:
  max_time: 0
"#;
    let err = Scenario::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("max_time"));
}

#[test]
fn test_load_scenario_from_file() {
    let dir = std::env::temp_dir().join("labwired-irqc-config-load");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("scenario.yaml");
    std::fs::write(&path, FULL).unwrap();

    let s = load_scenario(&path).unwrap();
    assert_eq!(s.sources.len(), 1);

    let missing = load_scenario(dir.join("missing.yaml")).unwrap_err();
    assert!(format!("{:#}", missing).contains("Failed to read scenario"));
}
