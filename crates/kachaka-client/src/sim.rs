//! In-process simulated robot for tests and offline use.
//!
//! [`SimulatedRobot`] implements [`KachakaStub`] by keeping the robot's
//! command lifecycle in memory:
//!
//! * **Start** – with `cancel_all` the running command is cancelled and the
//!   new one takes its place; without it a busy robot rejects the new command
//!   with [`error_codes::BUSY`].  Commands naming an unknown shelf or location
//!   are rejected and recorded as the last (failed) result.
//! * **Cancel** – the running command finishes as cancelled.  With nothing
//!   running the call is a no-op reporting [`error_codes::NO_COMMAND_RUNNING`]
//!   and no command.
//! * **Completion** – nothing finishes on its own.  Drive a command to its
//!   terminal state with [`SimulatedRobot::finish_running`].
//!
//! Transport failures can be injected per RPC with
//! [`SimulatedRobot::fail_next`]; the next call to that RPC returns
//! [`KachakaError::CallFailed`] and later calls succeed again.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kachaka_client::{KachakaApiClient, SimulatedRobot, StartOptions};
//! use kachaka_types::CommandState;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let robot = Arc::new(SimulatedRobot::new());
//! let client = KachakaApiClient::new(robot.clone());
//!
//! client.return_home(StartOptions::default()).await.unwrap();
//! assert!(client.is_command_running().await.unwrap());
//!
//! robot.finish_running(true, 0);
//! let (state, _) = client.get_command_state().await.unwrap();
//! assert_eq!(state, CommandState::Idle);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use kachaka_types::{
    CancelCommandResponse, Command, CommandResult, CommandState, EmptyRequest,
    GetCommandStateResponse, GetFrontCameraRosCameraInfoResponse,
    GetFrontCameraRosCompressedImageResponse, GetFrontCameraRosImageResponse,
    GetHistoryListResponse, GetLastCommandResultResponse, GetLocationsResponse,
    GetManualControlEnabledResponse, GetObjectDetectionResponse, GetPngMapResponse, GetRequest,
    GetRobotPoseResponse, GetRobotSerialNumberResponse, GetRobotVersionResponse,
    GetRosImuResponse, GetRosLaserScanResponse, GetRosOdometryResponse, GetShelvesResponse,
    History, KachakaError, Location, Map, OpaqueMessage, Pose, SetAutoHomingEnabledRequest,
    SetManualControlEnabledRequest, SetResultResponse, SetRobotVelocityRequest, Shelf,
    StartCommandRequest, StartCommandResponse, StatusCode,
};
use tracing::debug;
use uuid::Uuid;

use crate::config::SimulatorConfig;
use crate::stub::KachakaStub;

/// Error codes reported by the simulated service.
pub mod error_codes {
    /// The command was cancelled, either explicitly or by a pre-empting start.
    pub const CANCELLED: i32 = 10001;
    /// A command is running and the start request did not set `cancel_all`.
    pub const BUSY: i32 = 10002;
    /// Cancel was requested while nothing was running.
    pub const NO_COMMAND_RUNNING: i32 = 10003;
    /// The command named a shelf id the robot does not know.
    pub const SHELF_NOT_FOUND: i32 = 10004;
    /// The command named a location id the robot does not know.
    pub const LOCATION_NOT_FOUND: i32 = 10005;
    /// A velocity command arrived while manual control was disabled.
    pub const MANUAL_CONTROL_DISABLED: i32 = 10006;
}

const SIM_VERSION: &str = "sim-3.0.0";

#[derive(Debug)]
struct SimState {
    serial_number: String,
    shelves: Vec<Shelf>,
    locations: Vec<Location>,
    default_location_id: String,
    pose: Pose,
    running: Option<StartCommandRequest>,
    last: Option<(CommandResult, Command)>,
    history: Vec<History>,
    started: Vec<StartCommandRequest>,
    injected_failures: HashMap<&'static str, StatusCode>,
    auto_homing_enabled: bool,
    manual_control_enabled: bool,
    velocity: (f64, f64),
}

/// A robot service that lives in memory.
#[derive(Debug)]
pub struct SimulatedRobot {
    state: Mutex<SimState>,
}

impl Default for SimulatedRobot {
    fn default() -> Self {
        Self::from_config(&SimulatorConfig::default())
    }
}

impl SimulatedRobot {
    /// Create a simulated robot with the default demo layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simulated robot serving the layout in `config`.
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            state: Mutex::new(SimState {
                serial_number: config.serial_number.clone(),
                shelves: config.shelves.clone(),
                locations: config.locations.clone(),
                default_location_id: config.default_location_id.clone(),
                pose: Pose::default(),
                running: None,
                last: None,
                history: Vec::new(),
                started: Vec::new(),
                injected_failures: HashMap::new(),
                auto_homing_enabled: true,
                manual_control_enabled: false,
                velocity: (0.0, 0.0),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Simulation controls
    // -----------------------------------------------------------------------

    /// Replace the shelves the robot reports.
    pub fn set_shelves(&self, shelves: Vec<Shelf>) {
        self.lock().shelves = shelves;
    }

    /// Replace the locations the robot reports.
    pub fn set_locations(&self, locations: Vec<Location>, default_location_id: impl Into<String>) {
        let mut state = self.lock();
        state.locations = locations;
        state.default_location_id = default_location_id.into();
    }

    /// Make the next call to `method` (e.g. `"StartCommand"`) fail with
    /// `code`.
    pub fn fail_next(&self, method: &'static str, code: StatusCode) {
        self.lock().injected_failures.insert(method, code);
    }

    /// Finish the running command with the given outcome.  Returns the
    /// finished command, or `None` when nothing was running.
    pub fn finish_running(&self, success: bool, error_code: i32) -> Option<Command> {
        let mut state = self.lock();
        let request = state.running.take()?;
        let result = if success {
            CommandResult::ok()
        } else {
            CommandResult::failed(error_code)
        };
        if success && let Command::MoveToPose { x, y, yaw } = request.command {
            state.pose = Pose { x, y, theta: yaw };
        }
        state.record_terminal(result, request.command.clone());
        Some(request.command)
    }

    /// Every start request received, in arrival order, including rejected
    /// ones.
    pub fn start_requests(&self) -> Vec<StartCommandRequest> {
        self.lock().started.clone()
    }

    /// Last velocity command received (linear, angular).
    pub fn velocity(&self) -> (f64, f64) {
        self.lock().velocity
    }

    pub fn auto_homing_enabled(&self) -> bool {
        self.lock().auto_homing_enabled
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Consume any failure injected for `method` without holding the lock.
    fn check(&self, method: &'static str) -> Result<(), KachakaError> {
        self.enter(method).map(drop)
    }

    /// Lock the state, consuming any failure injected for `method`.
    fn enter(&self, method: &'static str) -> Result<MutexGuard<'_, SimState>, KachakaError> {
        let mut state = self.lock();
        if let Some(code) = state.injected_failures.remove(method) {
            debug!(method, %code, "simulated transport failure");
            return Err(KachakaError::call_failed(
                method,
                code,
                "injected by simulator",
            ));
        }
        Ok(state)
    }
}

impl SimState {
    fn record_terminal(&mut self, result: CommandResult, command: Command) {
        self.history.push(History {
            id: Uuid::new_v4().to_string(),
            command: command.clone(),
            success: result.success,
            error_code: result.error_code,
            command_executed_time: Utc::now(),
        });
        self.last = Some((result, command));
    }

    /// Reject commands that name a shelf or location the robot does not
    /// know.
    fn validate(&self, command: &Command) -> Result<(), i32> {
        let known_shelf = |id: &str| self.shelves.iter().any(|s| s.id == id);
        let known_location = |id: &str| self.locations.iter().any(|l| l.id == id);
        match command {
            Command::MoveShelf {
                target_shelf_id,
                destination_location_id,
            } => {
                if !known_shelf(target_shelf_id.as_str()) {
                    return Err(error_codes::SHELF_NOT_FOUND);
                }
                if !known_location(destination_location_id.as_str()) {
                    return Err(error_codes::LOCATION_NOT_FOUND);
                }
                Ok(())
            }
            Command::ReturnShelf { target_shelf_id }
                if !target_shelf_id.is_empty() && !known_shelf(target_shelf_id.as_str()) =>
            {
                Err(error_codes::SHELF_NOT_FOUND)
            }
            Command::MoveToLocation { target_location_id } if !known_location(target_location_id.as_str()) => {
                Err(error_codes::LOCATION_NOT_FOUND)
            }
            _ => Ok(()),
        }
    }
}

fn opaque(encoding: &str) -> OpaqueMessage {
    OpaqueMessage::new(encoding, Vec::new())
}

#[async_trait]
impl KachakaStub for SimulatedRobot {
    async fn get_robot_serial_number(
        &self,
        _request: GetRequest,
    ) -> Result<GetRobotSerialNumberResponse, KachakaError> {
        let state = self.enter("GetRobotSerialNumber")?;
        Ok(GetRobotSerialNumberResponse {
            serial_number: state.serial_number.clone(),
        })
    }

    async fn get_robot_version(
        &self,
        _request: GetRequest,
    ) -> Result<GetRobotVersionResponse, KachakaError> {
        self.check("GetRobotVersion")?;
        Ok(GetRobotVersionResponse {
            version: SIM_VERSION.to_string(),
        })
    }

    async fn get_robot_pose(
        &self,
        _request: GetRequest,
    ) -> Result<GetRobotPoseResponse, KachakaError> {
        let state = self.enter("GetRobotPose")?;
        Ok(GetRobotPoseResponse { pose: state.pose })
    }

    async fn get_png_map(&self, _request: GetRequest) -> Result<GetPngMapResponse, KachakaError> {
        self.check("GetPngMap")?;
        Ok(GetPngMapResponse {
            map: Map {
                name: "sim".to_string(),
                resolution: 0.05,
                ..Map::default()
            },
        })
    }

    async fn get_object_detection(
        &self,
        _request: GetRequest,
    ) -> Result<GetObjectDetectionResponse, KachakaError> {
        self.check("GetObjectDetection")?;
        Ok(GetObjectDetectionResponse {
            header: opaque("std_msgs/Header"),
            objects: Vec::new(),
        })
    }

    async fn get_ros_imu(&self, _request: GetRequest) -> Result<GetRosImuResponse, KachakaError> {
        self.check("GetRosImu")?;
        Ok(GetRosImuResponse {
            imu: opaque("sensor_msgs/Imu"),
        })
    }

    async fn get_ros_odometry(
        &self,
        _request: GetRequest,
    ) -> Result<GetRosOdometryResponse, KachakaError> {
        self.check("GetRosOdometry")?;
        Ok(GetRosOdometryResponse {
            odometry: opaque("nav_msgs/Odometry"),
        })
    }

    async fn get_ros_laser_scan(
        &self,
        _request: GetRequest,
    ) -> Result<GetRosLaserScanResponse, KachakaError> {
        self.check("GetRosLaserScan")?;
        Ok(GetRosLaserScanResponse {
            scan: opaque("sensor_msgs/LaserScan"),
        })
    }

    async fn get_front_camera_ros_camera_info(
        &self,
        _request: GetRequest,
    ) -> Result<GetFrontCameraRosCameraInfoResponse, KachakaError> {
        self.check("GetFrontCameraRosCameraInfo")?;
        Ok(GetFrontCameraRosCameraInfoResponse {
            camera_info: opaque("sensor_msgs/CameraInfo"),
        })
    }

    async fn get_front_camera_ros_image(
        &self,
        _request: GetRequest,
    ) -> Result<GetFrontCameraRosImageResponse, KachakaError> {
        self.check("GetFrontCameraRosImage")?;
        Ok(GetFrontCameraRosImageResponse {
            image: opaque("sensor_msgs/Image"),
        })
    }

    async fn get_front_camera_ros_compressed_image(
        &self,
        _request: GetRequest,
    ) -> Result<GetFrontCameraRosCompressedImageResponse, KachakaError> {
        self.check("GetFrontCameraRosCompressedImage")?;
        Ok(GetFrontCameraRosCompressedImageResponse {
            image: opaque("sensor_msgs/CompressedImage"),
        })
    }

    async fn start_command(
        &self,
        request: StartCommandRequest,
    ) -> Result<StartCommandResponse, KachakaError> {
        let mut state = self.enter("StartCommand")?;
        state.started.push(request.clone());

        if let Err(code) = state.validate(&request.command) {
            debug!(command = request.command.kind(), code, "simulator rejected command");
            state.record_terminal(CommandResult::failed(code), request.command);
            return Ok(StartCommandResponse {
                result: CommandResult::failed(code),
            });
        }

        if state.running.is_some() {
            if !request.cancel_all {
                return Ok(StartCommandResponse {
                    result: CommandResult::failed(error_codes::BUSY),
                });
            }
            if let Some(pre_empted) = state.running.take() {
                debug!(command = pre_empted.command.kind(), "simulator pre-empted command");
                state.record_terminal(
                    CommandResult::failed(error_codes::CANCELLED),
                    pre_empted.command,
                );
            }
        }

        state.running = Some(request);
        Ok(StartCommandResponse {
            result: CommandResult::ok(),
        })
    }

    async fn cancel_command(
        &self,
        _request: EmptyRequest,
    ) -> Result<CancelCommandResponse, KachakaError> {
        let mut state = self.enter("CancelCommand")?;
        match state.running.take() {
            Some(request) => {
                state.record_terminal(
                    CommandResult::failed(error_codes::CANCELLED),
                    request.command.clone(),
                );
                Ok(CancelCommandResponse {
                    result: CommandResult::ok(),
                    command: Some(request.command),
                })
            }
            None => Ok(CancelCommandResponse {
                result: CommandResult::failed(error_codes::NO_COMMAND_RUNNING),
                command: None,
            }),
        }
    }

    async fn get_command_state(
        &self,
        _request: GetRequest,
    ) -> Result<GetCommandStateResponse, KachakaError> {
        let state = self.enter("GetCommandState")?;
        Ok(match &state.running {
            Some(request) => GetCommandStateResponse {
                state: CommandState::Running,
                command: Some(request.command.clone()),
            },
            None => GetCommandStateResponse {
                state: CommandState::Idle,
                command: None,
            },
        })
    }

    async fn get_last_command_result(
        &self,
        _request: GetRequest,
    ) -> Result<GetLastCommandResultResponse, KachakaError> {
        let state = self.enter("GetLastCommandResult")?;
        Ok(match &state.last {
            Some((result, command)) => GetLastCommandResultResponse {
                result: *result,
                command: Some(command.clone()),
            },
            None => GetLastCommandResultResponse::default(),
        })
    }

    async fn get_locations(
        &self,
        _request: GetRequest,
    ) -> Result<GetLocationsResponse, KachakaError> {
        let state = self.enter("GetLocations")?;
        Ok(GetLocationsResponse {
            locations: state.locations.clone(),
            default_location_id: state.default_location_id.clone(),
        })
    }

    async fn get_shelves(&self, _request: GetRequest) -> Result<GetShelvesResponse, KachakaError> {
        let state = self.enter("GetShelves")?;
        Ok(GetShelvesResponse {
            shelves: state.shelves.clone(),
        })
    }

    async fn set_auto_homing_enabled(
        &self,
        request: SetAutoHomingEnabledRequest,
    ) -> Result<SetResultResponse, KachakaError> {
        let mut state = self.enter("SetAutoHomingEnabled")?;
        state.auto_homing_enabled = request.enable;
        Ok(SetResultResponse {
            result: CommandResult::ok(),
        })
    }

    async fn set_manual_control_enabled(
        &self,
        request: SetManualControlEnabledRequest,
    ) -> Result<SetResultResponse, KachakaError> {
        let mut state = self.enter("SetManualControlEnabled")?;
        state.manual_control_enabled = request.enable;
        if !request.enable {
            state.velocity = (0.0, 0.0);
        }
        Ok(SetResultResponse {
            result: CommandResult::ok(),
        })
    }

    async fn get_manual_control_enabled(
        &self,
        _request: GetRequest,
    ) -> Result<GetManualControlEnabledResponse, KachakaError> {
        let state = self.enter("GetManualControlEnabled")?;
        Ok(GetManualControlEnabledResponse {
            enabled: state.manual_control_enabled,
        })
    }

    async fn set_robot_velocity(
        &self,
        request: SetRobotVelocityRequest,
    ) -> Result<SetResultResponse, KachakaError> {
        let mut state = self.enter("SetRobotVelocity")?;
        if !state.manual_control_enabled {
            return Ok(SetResultResponse {
                result: CommandResult::failed(error_codes::MANUAL_CONTROL_DISABLED),
            });
        }
        state.velocity = (request.linear, request.angular);
        Ok(SetResultResponse {
            result: CommandResult::ok(),
        })
    }

    async fn get_history_list(
        &self,
        _request: GetRequest,
    ) -> Result<GetHistoryListResponse, KachakaError> {
        let state = self.enter("GetHistoryList")?;
        Ok(GetHistoryListResponse {
            histories: state.history.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(command: Command, cancel_all: bool) -> StartCommandRequest {
        StartCommandRequest {
            command,
            cancel_all,
            tts_on_success: String::new(),
            title: String::new(),
        }
    }

    #[tokio::test]
    async fn injected_failure_is_one_shot() {
        let robot = SimulatedRobot::new();
        robot.fail_next("GetShelves", StatusCode::Unavailable);

        let err = robot.get_shelves(GetRequest).await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::Unavailable));
        assert!(robot.get_shelves(GetRequest).await.is_ok());
    }

    #[tokio::test]
    async fn busy_robot_rejects_queued_start() {
        let robot = SimulatedRobot::new();
        robot.start_command(start(Command::ReturnHome, true)).await.unwrap();

        let response = robot
            .start_command(start(Command::DockShelf, false))
            .await
            .unwrap();
        assert_eq!(response.result, CommandResult::failed(error_codes::BUSY));

        let state = robot.get_command_state(GetRequest).await.unwrap();
        assert_eq!(state.command, Some(Command::ReturnHome));
    }

    #[tokio::test]
    async fn unknown_location_is_rejected_and_recorded() {
        let robot = SimulatedRobot::new();
        let response = robot
            .start_command(start(
                Command::MoveToLocation {
                    target_location_id: "nowhere".to_string(),
                },
                true,
            ))
            .await
            .unwrap();
        assert_eq!(
            response.result,
            CommandResult::failed(error_codes::LOCATION_NOT_FOUND)
        );

        let state = robot.get_command_state(GetRequest).await.unwrap();
        assert_eq!(state.state, CommandState::Idle);
        let last = robot.get_last_command_result(GetRequest).await.unwrap();
        assert!(!last.result.success);
    }

    #[tokio::test]
    async fn return_shelf_without_target_is_accepted() {
        let robot = SimulatedRobot::new();
        let response = robot
            .start_command(start(
                Command::ReturnShelf {
                    target_shelf_id: String::new(),
                },
                true,
            ))
            .await
            .unwrap();
        assert!(response.result.success);
    }

    #[tokio::test]
    async fn finished_move_to_pose_updates_pose() {
        let robot = SimulatedRobot::new();
        robot
            .start_command(start(
                Command::MoveToPose {
                    x: 1.5,
                    y: -0.5,
                    yaw: 0.25,
                },
                true,
            ))
            .await
            .unwrap();
        robot.finish_running(true, 0);

        let pose = robot.get_robot_pose(GetRequest).await.unwrap().pose;
        assert_eq!(
            pose,
            Pose {
                x: 1.5,
                y: -0.5,
                theta: 0.25
            }
        );
    }

    #[test]
    fn finish_running_with_nothing_running_is_none() {
        let robot = SimulatedRobot::new();
        assert!(robot.finish_running(true, 0).is_none());
    }

    #[tokio::test]
    async fn velocity_requires_manual_control() {
        let robot = SimulatedRobot::new();
        let velocity = SetRobotVelocityRequest {
            linear: 0.2,
            angular: 0.1,
        };
        let rejected = robot.set_robot_velocity(velocity).await.unwrap();
        assert_eq!(
            rejected.result,
            CommandResult::failed(error_codes::MANUAL_CONTROL_DISABLED)
        );

        robot
            .set_manual_control_enabled(SetManualControlEnabledRequest { enable: true })
            .await
            .unwrap();
        let accepted = robot.set_robot_velocity(velocity).await.unwrap();
        assert!(accepted.result.success);
        assert_eq!(robot.velocity(), (0.2, 0.1));
    }
}
