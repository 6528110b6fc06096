// tests/command_payload.rs

use std::error::Error;

use serde_json::{json, Value};

use missiongraph::command::{command_id_for, CommandEnvelope, CommandKind, CommandReport, CommandType};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn envelope_wire_shape() -> TestResult {
    let envelope = CommandEnvelope::new("LTV1", CommandKind::MoveToCoord { x: 20.0, y: 0.0 })
        .with_task_id("Move1");

    let value: Value = serde_json::from_str(&envelope.encode()?)?;
    assert_eq!(
        value,
        json!({
            "meta": {
                "command_id": "MM_Cmd_LTV1_MoveToCoord",
                "command_type": "MoveToCoord",
                "task_id": "Move1"
            },
            "command": { "type": "MoveToCoord", "x": 20.0, "y": 0.0 }
        })
    );
    Ok(())
}

#[test]
fn unstamped_envelope_omits_task_id() -> TestResult {
    let envelope = CommandEnvelope::new("Scout", CommandKind::Stop);
    let value: Value = serde_json::from_str(&envelope.encode()?)?;

    assert!(value["meta"].get("task_id").is_none());
    assert_eq!(value["command"], json!({ "type": "Stop" }));
    Ok(())
}

#[test]
fn report_decodes_from_foreign_json() -> TestResult {
    let raw = r#"{
        "meta": { "command_id": "MM_Cmd_LTV1_CaptureImage", "command_type": "CaptureImage" },
        "orig_cmd": {
            "meta": {
                "command_id": "MM_Cmd_LTV1_CaptureImage",
                "command_type": "CaptureImage",
                "task_id": "Snap"
            },
            "command": { "type": "CaptureImage", "exposure": 0.25 }
        },
        "reason": "Lens Obstructed"
    }"#;

    let report = CommandReport::decode(raw)?;
    assert_eq!(report.correlation_id(), Some("Snap"));
    assert_eq!(report.reason.as_deref(), Some("Lens Obstructed"));
    assert_eq!(report.orig_cmd.command_type(), CommandType::CaptureImage);
    assert!(report.data.is_null());
    Ok(())
}

#[test]
fn command_type_names() {
    assert_eq!(command_id_for("Truck", CommandType::PickUpAntenna), "MM_Cmd_Truck_PickUpAntenna");
    for ty in CommandType::ALL {
        assert_eq!(ty.as_str().parse::<CommandType>(), Ok(ty));
    }
    assert!("Teleport".parse::<CommandType>().is_err());
    assert_eq!(
        CommandKind::CameraPan { azimuth: 1.0, elevation: 2.0 }.command_type(),
        CommandType::CameraPan
    );
}

#[test]
fn policy_and_mode_names() {
    use missiongraph::types::{FailurePolicy, ResolutionMode};

    assert_eq!("cascade".parse::<FailurePolicy>(), Ok(FailurePolicy::Cascade));
    assert_eq!(" Clear_Plan ".parse::<FailurePolicy>(), Ok(FailurePolicy::ClearPlan));
    assert!("panic".parse::<FailurePolicy>().is_err());
    assert_eq!("strict".parse::<ResolutionMode>(), Ok(ResolutionMode::Strict));
    assert!("lenient".parse::<ResolutionMode>().is_err());
}
