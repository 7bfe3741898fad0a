//! The RPC seam.
//!
//! The client never speaks a wire protocol itself.  Every remote operation
//! goes through a [`KachakaStub`], which owns the channel to the robot and
//! turns each typed request into a typed response.
//!
//! # Overview
//!
//! - [`KachakaStub`] – the trait every transport must implement.
//! - [`SimulatedRobot`][crate::sim::SimulatedRobot] – an in-process service
//!   used by tests and the offline console.
//!
//! Implementations report transport failures as
//! [`KachakaError::CallFailed`]; a command the service accepted but could not
//! complete is a successful call whose response carries a failed
//! [`CommandResult`][kachaka_types::CommandResult].

use async_trait::async_trait;
use kachaka_types::{
    CancelCommandResponse, EmptyRequest, GetCommandStateResponse,
    GetFrontCameraRosCameraInfoResponse, GetFrontCameraRosCompressedImageResponse,
    GetFrontCameraRosImageResponse, GetHistoryListResponse, GetLastCommandResultResponse,
    GetLocationsResponse, GetManualControlEnabledResponse, GetObjectDetectionResponse,
    GetPngMapResponse, GetRequest, GetRobotPoseResponse, GetRobotSerialNumberResponse,
    GetRobotVersionResponse, GetRosImuResponse, GetRosLaserScanResponse, GetRosOdometryResponse,
    GetShelvesResponse, KachakaError, SetAutoHomingEnabledRequest, SetManualControlEnabledRequest,
    SetResultResponse, SetRobotVelocityRequest, StartCommandRequest, StartCommandResponse,
};

/// One async method per RPC exposed by the robot.
///
/// # Contract
///
/// * Each call is independent; implementations must not reorder, retry or
///   merge calls.
/// * A failed call returns [`KachakaError::CallFailed`] carrying the
///   transport status.
#[async_trait]
pub trait KachakaStub: Send + Sync {
    async fn get_robot_serial_number(
        &self,
        request: GetRequest,
    ) -> Result<GetRobotSerialNumberResponse, KachakaError>;

    async fn get_robot_version(
        &self,
        request: GetRequest,
    ) -> Result<GetRobotVersionResponse, KachakaError>;

    async fn get_robot_pose(&self, request: GetRequest)
    -> Result<GetRobotPoseResponse, KachakaError>;

    async fn get_png_map(&self, request: GetRequest) -> Result<GetPngMapResponse, KachakaError>;

    async fn get_object_detection(
        &self,
        request: GetRequest,
    ) -> Result<GetObjectDetectionResponse, KachakaError>;

    async fn get_ros_imu(&self, request: GetRequest) -> Result<GetRosImuResponse, KachakaError>;

    async fn get_ros_odometry(
        &self,
        request: GetRequest,
    ) -> Result<GetRosOdometryResponse, KachakaError>;

    async fn get_ros_laser_scan(
        &self,
        request: GetRequest,
    ) -> Result<GetRosLaserScanResponse, KachakaError>;

    async fn get_front_camera_ros_camera_info(
        &self,
        request: GetRequest,
    ) -> Result<GetFrontCameraRosCameraInfoResponse, KachakaError>;

    async fn get_front_camera_ros_image(
        &self,
        request: GetRequest,
    ) -> Result<GetFrontCameraRosImageResponse, KachakaError>;

    async fn get_front_camera_ros_compressed_image(
        &self,
        request: GetRequest,
    ) -> Result<GetFrontCameraRosCompressedImageResponse, KachakaError>;

    /// Start a command.  With `cancel_all` set the service pre-empts whatever
    /// is running; otherwise queuing or rejection is the service's call.
    async fn start_command(
        &self,
        request: StartCommandRequest,
    ) -> Result<StartCommandResponse, KachakaError>;

    async fn cancel_command(
        &self,
        request: EmptyRequest,
    ) -> Result<CancelCommandResponse, KachakaError>;

    async fn get_command_state(
        &self,
        request: GetRequest,
    ) -> Result<GetCommandStateResponse, KachakaError>;

    async fn get_last_command_result(
        &self,
        request: GetRequest,
    ) -> Result<GetLastCommandResultResponse, KachakaError>;

    async fn get_locations(&self, request: GetRequest)
    -> Result<GetLocationsResponse, KachakaError>;

    async fn get_shelves(&self, request: GetRequest) -> Result<GetShelvesResponse, KachakaError>;

    async fn set_auto_homing_enabled(
        &self,
        request: SetAutoHomingEnabledRequest,
    ) -> Result<SetResultResponse, KachakaError>;

    async fn set_manual_control_enabled(
        &self,
        request: SetManualControlEnabledRequest,
    ) -> Result<SetResultResponse, KachakaError>;

    async fn get_manual_control_enabled(
        &self,
        request: GetRequest,
    ) -> Result<GetManualControlEnabledResponse, KachakaError>;

    async fn set_robot_velocity(
        &self,
        request: SetRobotVelocityRequest,
    ) -> Result<SetResultResponse, KachakaError>;

    async fn get_history_list(
        &self,
        request: GetRequest,
    ) -> Result<GetHistoryListResponse, KachakaError>;
}
