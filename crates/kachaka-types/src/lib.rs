//! `kachaka-types` – message shapes shared by the Kachaka client and the
//! services it talks to.
//!
//! These types mirror the field names and tag discriminants of the robot's
//! RPC schema.  Telemetry payloads the client never inspects (IMU, odometry,
//! laser scans, camera frames) are carried as [`OpaqueMessage`] blobs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Layout catalog
// ─────────────────────────────────────────────────────────────────────────────

/// A shelf the robot can dock with and carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    /// Stable identifier assigned by the service.
    pub id: String,
    /// Human-readable label (e.g. `"kitchen-cart"`).  Not guaranteed unique.
    pub name: String,
}

impl Shelf {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A named destination on the robot's map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Stable identifier assigned by the service.
    pub id: String,
    /// Human-readable label (e.g. `"living-room"`).  Not guaranteed unique.
    pub name: String,
    /// Whether this is the robot's default (home) location.
    ///
    /// The service reports the default separately as `default_location_id`;
    /// the client fills this flag in when it returns a location list.
    #[serde(default)]
    pub is_default: bool,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// The robot's action union.  Exactly one variant is active per command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "snake_case")]
pub enum Command {
    /// Carry a shelf to a location.
    MoveShelf {
        target_shelf_id: String,
        destination_location_id: String,
    },
    /// Return a shelf to its home.  An empty id means the shelf most recently
    /// held by the robot.
    ReturnShelf { target_shelf_id: String },
    /// Release the currently docked shelf in place.
    UndockShelf,
    /// Drive to a registered location.
    MoveToLocation { target_location_id: String },
    /// Drive back to the charger.
    ReturnHome,
    /// Dock with the shelf in front of the robot.
    DockShelf,
    /// Speak `text` through the robot's speaker.
    Speak { text: String },
    /// Drive to a map pose (metres, metres, radians).
    MoveToPose { x: f64, y: f64, yaw: f64 },
}

impl Command {
    /// Short, stable name of the active variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::MoveShelf { .. } => "move_shelf",
            Command::ReturnShelf { .. } => "return_shelf",
            Command::UndockShelf => "undock_shelf",
            Command::MoveToLocation { .. } => "move_to_location",
            Command::ReturnHome => "return_home",
            Command::DockShelf => "dock_shelf",
            Command::Speak { .. } => "speak",
            Command::MoveToPose { .. } => "move_to_pose",
        }
    }
}

/// Lifecycle state reported by the service when polled.
///
/// Terminal outcomes are not states: once a command finishes the service
/// reports [`CommandState::Idle`] and the outcome is only available through
/// the last-command-result call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandState {
    #[default]
    Unspecified,
    Idle,
    Running,
}

/// Outcome of a call or of a finished command.
///
/// `error_code` is service-defined and only meaningful when `success` is
/// `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(default)]
    pub error_code: i32,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_code: 0,
        }
    }

    pub fn failed(error_code: i32) -> Self {
        Self {
            success: false,
            error_code,
        }
    }
}

/// One entry of the robot's command history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub id: String,
    pub command: Command,
    pub success: bool,
    pub error_code: i32,
    pub command_executed_time: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Robot pose on the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// PNG-encoded occupancy map plus its placement on the map frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Map {
    pub data: Vec<u8>,
    pub name: String,
    pub resolution: f64,
    pub width: u32,
    pub height: u32,
    pub origin: Pose,
}

/// A payload this layer forwards without interpreting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpaqueMessage {
    /// Schema type name, e.g. `"sensor_msgs/Imu"`.
    pub encoding: String,
    pub data: Vec<u8>,
}

impl OpaqueMessage {
    pub fn new(encoding: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            encoding: encoding.into(),
            data: data.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Argument-less request used by every getter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetRequest;

/// Argument-less request used by mutating calls such as cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmptyRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartCommandRequest {
    pub command: Command,
    /// Pre-empt whatever is running before starting `command`.
    pub cancel_all: bool,
    /// Spoken by the robot when the command succeeds.
    pub tts_on_success: String,
    /// Label shown in the robot's history and app.
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAutoHomingEnabledRequest {
    pub enable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetManualControlEnabledRequest {
    pub enable: bool,
}

/// Velocity command in m/s and rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetRobotVelocityRequest {
    pub linear: f64,
    pub angular: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetRobotSerialNumberResponse {
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetRobotVersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GetRobotPoseResponse {
    pub pose: Pose,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetPngMapResponse {
    pub map: Map,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetObjectDetectionResponse {
    pub header: OpaqueMessage,
    pub objects: Vec<OpaqueMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetRosImuResponse {
    pub imu: OpaqueMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetRosOdometryResponse {
    pub odometry: OpaqueMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetRosLaserScanResponse {
    pub scan: OpaqueMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetFrontCameraRosCameraInfoResponse {
    pub camera_info: OpaqueMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetFrontCameraRosImageResponse {
    pub image: OpaqueMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetFrontCameraRosCompressedImageResponse {
    pub image: OpaqueMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartCommandResponse {
    pub result: CommandResult,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CancelCommandResponse {
    pub result: CommandResult,
    /// The command that was cancelled; `None` when nothing was running.
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetCommandStateResponse {
    pub state: CommandState,
    /// The running command; absent unless `state` is `Running`.
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetLastCommandResultResponse {
    pub result: CommandResult,
    /// The finished command; `None` before any command has finished.
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetLocationsResponse {
    pub locations: Vec<Location>,
    pub default_location_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetShelvesResponse {
    pub shelves: Vec<Shelf>,
}

/// Response shared by the setter calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetResultResponse {
    pub result: CommandResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetManualControlEnabledResponse {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetHistoryListResponse {
    pub histories: Vec<History>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Transport-level status attached to a failed call.  Mirrors the gRPC
/// status code set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Cancelled => "CANCELLED",
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::PermissionDenied => "PERMISSION_DENIED",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Aborted => "ABORTED",
            StatusCode::OutOfRange => "OUT_OF_RANGE",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::DataLoss => "DATA_LOSS",
            StatusCode::Unauthenticated => "UNAUTHENTICATED",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the Kachaka client.
///
/// A command that the service accepted but could not complete is *not* an
/// error; it is reported through [`CommandResult`].
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KachakaError {
    /// The remote call itself failed (connection lost, deadline exceeded,
    /// service-side fault).
    #[error("{method} call failed ({code}): {message}")]
    CallFailed {
        method: String,
        code: StatusCode,
        message: String,
    },

    #[error("Invalid target endpoint '{0}': expected host:port")]
    InvalidTarget(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

impl KachakaError {
    pub fn call_failed(
        method: impl Into<String>,
        code: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        KachakaError::CallFailed {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Transport status of a failed call, if this is one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            KachakaError::CallFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serializes_with_variant_tag() {
        let cmd = Command::MoveShelf {
            target_shelf_id: "S1".to_string(),
            destination_location_id: "L2".to_string(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "move_shelf");
        assert_eq!(json["payload"]["target_shelf_id"], "S1");

        let back: Command = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn unit_variants_carry_no_payload() {
        let json = serde_json::to_string(&Command::ReturnHome).unwrap();
        assert_eq!(json, r#"{"command":"return_home"}"#);
    }

    #[test]
    fn command_kind_names_the_variant() {
        assert_eq!(Command::DockShelf.kind(), "dock_shelf");
        assert_eq!(
            Command::MoveToPose {
                x: 1.0,
                y: 2.0,
                yaw: 0.5
            }
            .kind(),
            "move_to_pose"
        );
    }

    #[test]
    fn command_state_defaults_to_unspecified() {
        assert_eq!(CommandState::default(), CommandState::Unspecified);
        let json = serde_json::to_string(&CommandState::Running).unwrap();
        assert_eq!(json, r#""RUNNING""#);
    }

    #[test]
    fn location_without_default_flag_deserializes() {
        let loc: Location = serde_json::from_str(r#"{"id":"L1","name":"kitchen"}"#).unwrap();
        assert!(!loc.is_default);
    }

    #[test]
    fn call_failed_display_carries_status() {
        let err = KachakaError::call_failed("StartCommand", StatusCode::Unavailable, "connection refused");
        let text = err.to_string();
        assert!(text.contains("StartCommand"));
        assert!(text.contains("UNAVAILABLE"));
        assert_eq!(err.status_code(), Some(StatusCode::Unavailable));
    }

    #[test]
    fn non_call_errors_have_no_status() {
        let err = KachakaError::InvalidTarget("nope".to_string());
        assert!(err.status_code().is_none());
        assert!(err.to_string().contains("host:port"));
    }
}
