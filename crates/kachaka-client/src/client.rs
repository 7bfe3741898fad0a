//! [`KachakaApiClient`] – the command-lifecycle client.
//!
//! Wraps a [`KachakaStub`] and a [`ShelfLocationResolver`]:
//!
//! * **Commands** – [`start_command`][KachakaApiClient::start_command] and
//!   its wrappers build a [`Command`], resolving shelf and location names
//!   through the resolver first.
//! * **Lifecycle** – completion is polled with
//!   [`get_command_state`][KachakaApiClient::get_command_state]; the outcome
//!   of a finished command is read with
//!   [`get_last_command_result`][KachakaApiClient::get_last_command_result].
//! * **Telemetry** – read-only getters forward one request and unwrap one
//!   response field.
//!
//! Failures are never retried.  A failed call surfaces as
//! [`KachakaError::CallFailed`]; a command the robot could not complete comes
//! back as an `Ok` [`CommandResult`] with `success == false`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kachaka_client::{KachakaApiClient, SimulatedRobot, StartOptions};
//!
//! # async fn demo() -> Result<(), kachaka_types::KachakaError> {
//! let client = KachakaApiClient::new(Arc::new(SimulatedRobot::new()));
//! client.update_resolver().await?;
//!
//! let result = client
//!     .move_shelf("kitchen-cart", "living-room", StartOptions::default())
//!     .await?;
//! if !result.success {
//!     eprintln!("rejected with error code {}", result.error_code);
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use kachaka_types::{
    Command, CommandResult, CommandState, EmptyRequest, GetRequest, History, KachakaError,
    Location, Map, OpaqueMessage, Pose, SetAutoHomingEnabledRequest,
    SetManualControlEnabledRequest, SetRobotVelocityRequest, Shelf, StartCommandRequest,
};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_TARGET, validate_target};
use crate::resolver::ShelfLocationResolver;
use crate::stub::KachakaStub;

// ─────────────────────────────────────────────────────────────────────────────
// StartOptions
// ─────────────────────────────────────────────────────────────────────────────

/// Per-command options forwarded verbatim with every start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOptions {
    /// Pre-empt the running command before starting this one.
    pub cancel_all: bool,
    /// Text the robot speaks when the command succeeds.
    pub tts_on_success: String,
    /// Label recorded with the command in the robot's history.
    pub title: String,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            cancel_all: true,
            tts_on_success: String::new(),
            title: String::new(),
        }
    }
}

impl StartOptions {
    /// Options that leave a running command alone; whether the new command
    /// queues or is rejected is up to the service.
    pub fn queued() -> Self {
        Self {
            cancel_all: false,
            ..Self::default()
        }
    }

    pub fn with_tts_on_success(mut self, text: impl Into<String>) -> Self {
        self.tts_on_success = text.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// KachakaApiClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for one robot.
///
/// The resolver catalog starts empty.  Call
/// [`update_resolver`][Self::update_resolver] before passing shelf or
/// location names, and again whenever the robot's layout may have changed;
/// the client never refreshes on its own.
pub struct KachakaApiClient {
    stub: Arc<dyn KachakaStub>,
    resolver: ShelfLocationResolver,
    target: String,
}

impl KachakaApiClient {
    /// Create a client over `stub`, recorded against the default endpoint.
    pub fn new(stub: Arc<dyn KachakaStub>) -> Self {
        Self {
            stub,
            resolver: ShelfLocationResolver::new(),
            target: DEFAULT_TARGET.to_string(),
        }
    }

    /// Create a client over `stub` for the endpoint named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`KachakaError::InvalidTarget`] if `config.target` is not a
    /// `host:port` pair.
    pub fn with_config(
        stub: Arc<dyn KachakaStub>,
        config: &ClientConfig,
    ) -> Result<Self, KachakaError> {
        validate_target(&config.target)?;
        Ok(Self {
            stub,
            resolver: ShelfLocationResolver::new(),
            target: config.target.clone(),
        })
    }

    /// The `host:port` endpoint this client talks to.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn resolver(&self) -> &ShelfLocationResolver {
        &self.resolver
    }

    /// Fetch the shelf and location lists and install them in the resolver.
    ///
    /// Both lists are fetched before anything is installed: if either call
    /// fails the previous catalog stays in place.
    pub async fn update_resolver(&self) -> Result<(), KachakaError> {
        let shelves = self.get_shelves().await?;
        let locations = self.get_locations().await?;
        info!(
            shelves = shelves.len(),
            locations = locations.len(),
            "resolver catalog refreshed"
        );
        self.resolver.set_catalog(shelves, locations);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Command lifecycle
    // -----------------------------------------------------------------------

    /// Send `command` to the robot.
    ///
    /// The returned [`CommandResult`] reports whether the service accepted
    /// the command, not whether it finished.  Poll
    /// [`get_command_state`][Self::get_command_state] to wait for completion.
    pub async fn start_command(
        &self,
        command: Command,
        options: StartOptions,
    ) -> Result<CommandResult, KachakaError> {
        info!(
            command = command.kind(),
            cancel_all = options.cancel_all,
            title = %options.title,
            "starting command"
        );
        let request = StartCommandRequest {
            command,
            cancel_all: options.cancel_all,
            tts_on_success: options.tts_on_success,
            title: options.title,
        };
        let response = self
            .call("StartCommand", self.stub.start_command(request))
            .await?;
        Ok(response.result)
    }

    /// Carry a shelf to a location.  Both arguments accept a name or an id.
    pub async fn move_shelf(
        &self,
        shelf_name_or_id: &str,
        location_name_or_id: &str,
        options: StartOptions,
    ) -> Result<CommandResult, KachakaError> {
        let command = Command::MoveShelf {
            target_shelf_id: self.resolver.resolve_shelf(shelf_name_or_id),
            destination_location_id: self.resolver.resolve_location(location_name_or_id),
        };
        self.start_command(command, options).await
    }

    /// Return a shelf to its home.  Pass `""` for the most recently held
    /// shelf.
    pub async fn return_shelf(
        &self,
        shelf_name_or_id: &str,
        options: StartOptions,
    ) -> Result<CommandResult, KachakaError> {
        let command = Command::ReturnShelf {
            target_shelf_id: self.resolver.resolve_shelf(shelf_name_or_id),
        };
        self.start_command(command, options).await
    }

    pub async fn undock_shelf(&self, options: StartOptions) -> Result<CommandResult, KachakaError> {
        self.start_command(Command::UndockShelf, options).await
    }

    /// Drive to a location, given by name or id.
    pub async fn move_to_location(
        &self,
        location_name_or_id: &str,
        options: StartOptions,
    ) -> Result<CommandResult, KachakaError> {
        let command = Command::MoveToLocation {
            target_location_id: self.resolver.resolve_location(location_name_or_id),
        };
        self.start_command(command, options).await
    }

    pub async fn return_home(&self, options: StartOptions) -> Result<CommandResult, KachakaError> {
        self.start_command(Command::ReturnHome, options).await
    }

    pub async fn dock_shelf(&self, options: StartOptions) -> Result<CommandResult, KachakaError> {
        self.start_command(Command::DockShelf, options).await
    }

    pub async fn speak(
        &self,
        text: impl Into<String>,
        options: StartOptions,
    ) -> Result<CommandResult, KachakaError> {
        let command = Command::Speak { text: text.into() };
        self.start_command(command, options).await
    }

    pub async fn move_to_pose(
        &self,
        x: f64,
        y: f64,
        yaw: f64,
        options: StartOptions,
    ) -> Result<CommandResult, KachakaError> {
        self.start_command(Command::MoveToPose { x, y, yaw }, options)
            .await
    }

    /// Cancel whatever is running.  Returns the outcome and the cancelled
    /// command, which is `None` when nothing was running.
    pub async fn cancel_command(&self) -> Result<(CommandResult, Option<Command>), KachakaError> {
        let response = self
            .call("CancelCommand", self.stub.cancel_command(EmptyRequest))
            .await?;
        Ok((response.result, response.command))
    }

    /// Poll the lifecycle state and, while running, the active command.
    pub async fn get_command_state(
        &self,
    ) -> Result<(CommandState, Option<Command>), KachakaError> {
        let response = self
            .call("GetCommandState", self.stub.get_command_state(GetRequest))
            .await?;
        Ok((response.state, response.command))
    }

    pub async fn is_command_running(&self) -> Result<bool, KachakaError> {
        let (state, _) = self.get_command_state().await?;
        Ok(state == CommandState::Running)
    }

    pub async fn get_running_command(&self) -> Result<Option<Command>, KachakaError> {
        let (_, command) = self.get_command_state().await?;
        Ok(command)
    }

    /// Outcome of the most recently finished command, regardless of what has
    /// started since.
    pub async fn get_last_command_result(
        &self,
    ) -> Result<(CommandResult, Option<Command>), KachakaError> {
        let response = self
            .call(
                "GetLastCommandResult",
                self.stub.get_last_command_result(GetRequest),
            )
            .await?;
        Ok((response.result, response.command))
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Registered locations, with `is_default` set on the default one.
    pub async fn get_locations(&self) -> Result<Vec<Location>, KachakaError> {
        let response = self
            .call("GetLocations", self.stub.get_locations(GetRequest))
            .await?;
        Ok(mark_default(
            response.locations,
            &response.default_location_id,
        ))
    }

    pub async fn get_default_location_id(&self) -> Result<String, KachakaError> {
        let response = self
            .call("GetLocations", self.stub.get_locations(GetRequest))
            .await?;
        Ok(response.default_location_id)
    }

    pub async fn get_shelves(&self) -> Result<Vec<Shelf>, KachakaError> {
        let response = self
            .call("GetShelves", self.stub.get_shelves(GetRequest))
            .await?;
        Ok(response.shelves)
    }

    // -----------------------------------------------------------------------
    // Telemetry
    // -----------------------------------------------------------------------

    pub async fn get_robot_serial_number(&self) -> Result<String, KachakaError> {
        let response = self
            .call(
                "GetRobotSerialNumber",
                self.stub.get_robot_serial_number(GetRequest),
            )
            .await?;
        Ok(response.serial_number)
    }

    pub async fn get_robot_version(&self) -> Result<String, KachakaError> {
        let response = self
            .call("GetRobotVersion", self.stub.get_robot_version(GetRequest))
            .await?;
        Ok(response.version)
    }

    pub async fn get_robot_pose(&self) -> Result<Pose, KachakaError> {
        let response = self
            .call("GetRobotPose", self.stub.get_robot_pose(GetRequest))
            .await?;
        Ok(response.pose)
    }

    pub async fn get_png_map(&self) -> Result<Map, KachakaError> {
        let response = self
            .call("GetPngMap", self.stub.get_png_map(GetRequest))
            .await?;
        Ok(response.map)
    }

    /// Detection header and detected objects.
    pub async fn get_object_detection(
        &self,
    ) -> Result<(OpaqueMessage, Vec<OpaqueMessage>), KachakaError> {
        let response = self
            .call(
                "GetObjectDetection",
                self.stub.get_object_detection(GetRequest),
            )
            .await?;
        Ok((response.header, response.objects))
    }

    pub async fn get_ros_imu(&self) -> Result<OpaqueMessage, KachakaError> {
        let response = self
            .call("GetRosImu", self.stub.get_ros_imu(GetRequest))
            .await?;
        Ok(response.imu)
    }

    pub async fn get_ros_odometry(&self) -> Result<OpaqueMessage, KachakaError> {
        let response = self
            .call("GetRosOdometry", self.stub.get_ros_odometry(GetRequest))
            .await?;
        Ok(response.odometry)
    }

    pub async fn get_ros_laser_scan(&self) -> Result<OpaqueMessage, KachakaError> {
        let response = self
            .call("GetRosLaserScan", self.stub.get_ros_laser_scan(GetRequest))
            .await?;
        Ok(response.scan)
    }

    pub async fn get_front_camera_ros_camera_info(&self) -> Result<OpaqueMessage, KachakaError> {
        let response = self
            .call(
                "GetFrontCameraRosCameraInfo",
                self.stub.get_front_camera_ros_camera_info(GetRequest),
            )
            .await?;
        Ok(response.camera_info)
    }

    pub async fn get_front_camera_ros_image(&self) -> Result<OpaqueMessage, KachakaError> {
        let response = self
            .call(
                "GetFrontCameraRosImage",
                self.stub.get_front_camera_ros_image(GetRequest),
            )
            .await?;
        Ok(response.image)
    }

    pub async fn get_front_camera_ros_compressed_image(
        &self,
    ) -> Result<OpaqueMessage, KachakaError> {
        let response = self
            .call(
                "GetFrontCameraRosCompressedImage",
                self.stub.get_front_camera_ros_compressed_image(GetRequest),
            )
            .await?;
        Ok(response.image)
    }

    pub async fn get_history_list(&self) -> Result<Vec<History>, KachakaError> {
        let response = self
            .call("GetHistoryList", self.stub.get_history_list(GetRequest))
            .await?;
        Ok(response.histories)
    }

    // -----------------------------------------------------------------------
    // Robot settings
    // -----------------------------------------------------------------------

    pub async fn set_auto_homing_enabled(&self, enable: bool) -> Result<CommandResult, KachakaError> {
        let request = SetAutoHomingEnabledRequest { enable };
        let response = self
            .call(
                "SetAutoHomingEnabled",
                self.stub.set_auto_homing_enabled(request),
            )
            .await?;
        Ok(response.result)
    }

    pub async fn set_manual_control_enabled(
        &self,
        enable: bool,
    ) -> Result<CommandResult, KachakaError> {
        let request = SetManualControlEnabledRequest { enable };
        let response = self
            .call(
                "SetManualControlEnabled",
                self.stub.set_manual_control_enabled(request),
            )
            .await?;
        Ok(response.result)
    }

    pub async fn get_manual_control_enabled(&self) -> Result<bool, KachakaError> {
        let response = self
            .call(
                "GetManualControlEnabled",
                self.stub.get_manual_control_enabled(GetRequest),
            )
            .await?;
        Ok(response.enabled)
    }

    /// Drive with a raw velocity (m/s, rad/s).  The robot only honours this
    /// while manual control is enabled.
    pub async fn set_robot_velocity(
        &self,
        linear: f64,
        angular: f64,
    ) -> Result<CommandResult, KachakaError> {
        let request = SetRobotVelocityRequest { linear, angular };
        let response = self
            .call("SetRobotVelocity", self.stub.set_robot_velocity(request))
            .await?;
        Ok(response.result)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn call<T, F>(&self, method: &'static str, rpc: F) -> Result<T, KachakaError>
    where
        F: Future<Output = Result<T, KachakaError>>,
    {
        debug!(endpoint = %self.target, method, "rpc");
        rpc.await.inspect_err(|e| {
            warn!(endpoint = %self.target, method, error = %e, "rpc failed");
        })
    }
}

fn mark_default(mut locations: Vec<Location>, default_location_id: &str) -> Vec<Location> {
    for location in &mut locations {
        location.is_default = location.id == default_location_id;
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimulatedRobot, error_codes};
    use kachaka_types::StatusCode;

    #[test]
    fn default_options_pre_empt() {
        let options = StartOptions::default();
        assert!(options.cancel_all);
        assert!(options.tts_on_success.is_empty());
        assert!(options.title.is_empty());
    }

    #[test]
    fn queued_options_keep_annotations_settable() {
        let options = StartOptions::queued()
            .with_title("restock")
            .with_tts_on_success("done");
        assert!(!options.cancel_all);
        assert_eq!(options.title, "restock");
        assert_eq!(options.tts_on_success, "done");
    }

    #[test]
    fn mark_default_flags_only_the_default() {
        let locations = vec![
            Location::new("L1", "charger"),
            Location::new("L2", "kitchen"),
        ];
        let marked = mark_default(locations, "L1");
        assert!(marked[0].is_default);
        assert!(!marked[1].is_default);
    }

    #[test]
    fn mark_default_with_unknown_id_flags_nothing() {
        let marked = mark_default(vec![Location::new("L1", "charger")], "");
        assert!(!marked[0].is_default);
    }

    // ── Command lifecycle against the simulated robot ─────────────────────

    /// Client plus a handle on the robot behind it, with the catalog loaded.
    async fn connected() -> (KachakaApiClient, Arc<SimulatedRobot>) {
        let robot = Arc::new(SimulatedRobot::new());
        robot.set_shelves(vec![
            Shelf::new("S1", "kitchen-cart"),
            Shelf::new("S2", "laundry"),
        ]);
        robot.set_locations(
            vec![
                Location::new("L1", "living-room"),
                Location::new("L2", "bedroom"),
            ],
            "L1",
        );
        let client = KachakaApiClient::new(robot.clone());
        client.update_resolver().await.unwrap();
        (client, robot)
    }

    fn last_request(robot: &SimulatedRobot) -> StartCommandRequest {
        robot.start_requests().pop().expect("a start request")
    }

    #[tokio::test]
    async fn move_shelf_resolves_names_before_sending() {
        let (client, robot) = connected().await;

        let result = client
            .move_shelf("kitchen-cart", "bedroom", StartOptions::default())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            last_request(&robot).command,
            Command::MoveShelf {
                target_shelf_id: "S1".to_string(),
                destination_location_id: "L2".to_string(),
            }
        );

        // Ids pass through untouched.
        robot.finish_running(true, 0);
        client
            .move_shelf("kitchen-cart", "L2", StartOptions::default())
            .await
            .unwrap();
        assert_eq!(
            last_request(&robot).command,
            Command::MoveShelf {
                target_shelf_id: "S1".to_string(),
                destination_location_id: "L2".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_shelf_name_is_sent_unchanged() {
        let (client, robot) = connected().await;

        let result = client
            .return_shelf("S9", StartOptions::default())
            .await
            .unwrap();
        assert_eq!(
            last_request(&robot).command,
            Command::ReturnShelf {
                target_shelf_id: "S9".to_string()
            }
        );
        // The service, not the client, rejects the unknown id.
        assert_eq!(result, CommandResult::failed(error_codes::SHELF_NOT_FOUND));
    }

    #[tokio::test]
    async fn empty_shelf_returns_the_held_shelf() {
        let (client, robot) = connected().await;
        client.return_shelf("", StartOptions::default()).await.unwrap();
        assert_eq!(
            last_request(&robot).command,
            Command::ReturnShelf {
                target_shelf_id: String::new()
            }
        );
    }

    #[tokio::test]
    async fn cancel_all_pre_empts_the_running_command() {
        let (client, _robot) = connected().await;
        client
            .move_to_location("living-room", StartOptions::default())
            .await
            .unwrap();

        let result = client
            .speak("hello", StartOptions::default())
            .await
            .unwrap();
        assert!(result.success);

        let (state, command) = client.get_command_state().await.unwrap();
        assert_eq!(state, CommandState::Running);
        assert_eq!(
            command,
            Some(Command::Speak {
                text: "hello".to_string()
            })
        );

        let (last, last_command) = client.get_last_command_result().await.unwrap();
        assert_eq!(last, CommandResult::failed(error_codes::CANCELLED));
        assert_eq!(
            last_command,
            Some(Command::MoveToLocation {
                target_location_id: "L1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn queued_start_is_rejected_while_busy() {
        let (client, _robot) = connected().await;
        client.return_home(StartOptions::default()).await.unwrap();

        let result = client.dock_shelf(StartOptions::queued()).await.unwrap();
        assert_eq!(result, CommandResult::failed(error_codes::BUSY));
        assert_eq!(
            client.get_running_command().await.unwrap(),
            Some(Command::ReturnHome)
        );
    }

    #[tokio::test]
    async fn finished_command_leaves_state_idle_and_result_readable() {
        let (client, robot) = connected().await;
        client
            .move_to_pose(1.0, 2.0, 0.5, StartOptions::default())
            .await
            .unwrap();
        assert!(client.is_command_running().await.unwrap());

        robot.finish_running(false, 42);

        let (state, command) = client.get_command_state().await.unwrap();
        assert_eq!(state, CommandState::Idle);
        assert_eq!(command, None);
        assert!(!client.is_command_running().await.unwrap());
        assert_eq!(client.get_running_command().await.unwrap(), None);

        let (result, command) = client.get_last_command_result().await.unwrap();
        assert_eq!(result, CommandResult::failed(42));
        assert_eq!(
            command,
            Some(Command::MoveToPose {
                x: 1.0,
                y: 2.0,
                yaw: 0.5
            })
        );

        // A later start does not overwrite the last finished result.
        client.undock_shelf(StartOptions::default()).await.unwrap();
        let (result, _) = client.get_last_command_result().await.unwrap();
        assert_eq!(result, CommandResult::failed(42));
    }

    #[tokio::test]
    async fn cancel_with_nothing_running_is_a_no_op() {
        let (client, _robot) = connected().await;
        let (result, command) = client.cancel_command().await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error_code, error_codes::NO_COMMAND_RUNNING);
        assert_eq!(command, None);
    }

    #[tokio::test]
    async fn cancel_returns_the_cancelled_command() {
        let (client, _robot) = connected().await;
        client.return_home(StartOptions::default()).await.unwrap();

        let (result, command) = client.cancel_command().await.unwrap();
        assert!(result.success);
        assert_eq!(command, Some(Command::ReturnHome));
        assert!(!client.is_command_running().await.unwrap());
    }

    #[tokio::test]
    async fn start_options_are_forwarded_verbatim() {
        let (client, robot) = connected().await;
        client
            .speak(
                "done",
                StartOptions::queued()
                    .with_title("announce")
                    .with_tts_on_success("finished"),
            )
            .await
            .unwrap();

        let request = last_request(&robot);
        assert!(!request.cancel_all);
        assert_eq!(request.title, "announce");
        assert_eq!(request.tts_on_success, "finished");
    }

    #[tokio::test]
    async fn transport_failure_propagates_status() {
        let (client, robot) = connected().await;
        robot.fail_next("StartCommand", StatusCode::DeadlineExceeded);

        let err = client
            .return_home(StartOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::DeadlineExceeded));
        assert!(!client.is_command_running().await.unwrap());
    }

    #[tokio::test]
    async fn update_resolver_is_idempotent() {
        let (client, robot) = connected().await;
        client.update_resolver().await.unwrap();
        client.update_resolver().await.unwrap();

        client
            .move_to_location("bedroom", StartOptions::default())
            .await
            .unwrap();
        assert_eq!(
            last_request(&robot).command,
            Command::MoveToLocation {
                target_location_id: "L2".to_string()
            }
        );
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_catalog() {
        let (client, robot) = connected().await;
        robot.set_shelves(vec![Shelf::new("S7", "kitchen-cart")]);
        robot.fail_next("GetLocations", StatusCode::Unavailable);

        let err = client.update_resolver().await.unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode::Unavailable));
        assert_eq!(client.resolver().resolve_shelf("kitchen-cart"), "S1");

        client.update_resolver().await.unwrap();
        assert_eq!(client.resolver().resolve_shelf("kitchen-cart"), "S7");
    }

    #[tokio::test]
    async fn layout_getters_mark_the_default_location() {
        let (client, _robot) = connected().await;
        let locations = client.get_locations().await.unwrap();
        let defaults: Vec<_> = locations
            .iter()
            .filter(|l| l.is_default)
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(defaults, ["L1"]);
        assert_eq!(client.get_default_location_id().await.unwrap(), "L1");
        assert_eq!(client.get_shelves().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn telemetry_getters_forward_the_payload() {
        let (client, _robot) = connected().await;
        assert_eq!(client.get_robot_serial_number().await.unwrap(), "SIM-0000");
        assert!(!client.get_robot_version().await.unwrap().is_empty());
        assert_eq!(client.get_robot_pose().await.unwrap(), Pose::default());
        assert_eq!(client.get_png_map().await.unwrap().name, "sim");
        assert_eq!(
            client.get_ros_imu().await.unwrap().encoding,
            "sensor_msgs/Imu"
        );
        let (header, objects) = client.get_object_detection().await.unwrap();
        assert_eq!(header.encoding, "std_msgs/Header");
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn history_records_terminal_outcomes() {
        let (client, robot) = connected().await;
        client.return_home(StartOptions::default()).await.unwrap();
        robot.finish_running(true, 0);
        client.dock_shelf(StartOptions::default()).await.unwrap();
        client.cancel_command().await.unwrap();

        let histories = client.get_history_list().await.unwrap();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].command, Command::ReturnHome);
        assert!(histories[0].success);
        assert_eq!(histories[1].command, Command::DockShelf);
        assert_eq!(histories[1].error_code, error_codes::CANCELLED);
    }

    #[tokio::test]
    async fn robot_settings_round_trip() {
        let (client, robot) = connected().await;

        assert!(client.set_auto_homing_enabled(false).await.unwrap().success);
        assert!(!robot.auto_homing_enabled());

        assert!(!client.get_manual_control_enabled().await.unwrap());
        assert!(client.set_manual_control_enabled(true).await.unwrap().success);
        assert!(client.get_manual_control_enabled().await.unwrap());

        assert!(client.set_robot_velocity(0.3, -0.1).await.unwrap().success);
        assert_eq!(robot.velocity(), (0.3, -0.1));
    }

    #[test]
    fn with_config_rejects_malformed_target() {
        let config = ClientConfig {
            target: "no-port".to_string(),
            ..ClientConfig::default()
        };
        let result = KachakaApiClient::with_config(Arc::new(SimulatedRobot::new()), &config);
        assert!(matches!(result, Err(KachakaError::InvalidTarget(_))));

        let client =
            KachakaApiClient::with_config(Arc::new(SimulatedRobot::new()), &ClientConfig::default())
                .unwrap();
        assert_eq!(client.target(), DEFAULT_TARGET);
    }
}
