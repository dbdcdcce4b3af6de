use std::sync::{Arc, Mutex};

use bevy::diagnostic::DiagnosticsStore;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use constants::texture::MAX_POINT_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::engine::buffer::point_buffer::PointBuffer;
use crate::engine::buffer::point_feed::PointFeed;
use crate::engine::core::app_state::{ViewerActive, ViewerLifecycleEvent, ViewerState};
use crate::engine::core::frame_loop::FrameLoop;
use crate::engine::systems::status_tracking::{ViewerStatus, smoothed_fps};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure. Requests without an id are notifications.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource queueing outgoing traffic to the host until the end of the frame.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the host.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Raw message transport shared with the platform side.
///
/// On wasm the window message listener fills `incoming` and outgoing messages
/// are posted to the parent frame. Elsewhere outgoing messages collect in
/// `outgoing` for an embedding process to drain.
#[derive(Resource, Clone, Default)]
pub struct RpcChannel {
    incoming: Arc<Mutex<Vec<String>>>,
    outgoing: Arc<Mutex<Vec<String>>>,
}

impl RpcChannel {
    pub fn push_incoming(&self, message: impl Into<String>) {
        if let Ok(mut queue) = self.incoming.lock() {
            queue.push(message.into());
        }
    }

    pub fn drain_outgoing(&self) -> Vec<String> {
        self.outgoing
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }

    fn drain_incoming(&self) -> Vec<String> {
        self.incoming
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }

    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    fn push_outgoing(&self, message: String) {
        if let Ok(mut queue) = self.outgoing.lock() {
            queue.push(message);
        }
    }
}

/// Stages of the RPC round trip within a frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RpcSet {
    /// Incoming messages are decoded and dispatched.
    Receive,
    /// Queued notifications and responses leave the frame.
    Send,
}

/// Plugin establishing the JSON-RPC layer between the viewer and its host.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .init_resource::<RpcChannel>()
            .add_event::<IncomingRpcMessage>()
            .configure_sets(Update, RpcSet::Receive.before(RpcSet::Send))
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .in_set(RpcSet::Receive),
            )
            .add_systems(Update, send_outgoing_messages.in_set(RpcSet::Send));

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(channel: Res<RpcChannel>) {
    let listener_channel = channel.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                listener_channel.push_incoming(message_str);
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let Some(window) = window() else {
        error!("Window object not available, RPC listener not installed");
        return;
    };
    if let Err(e) =
        window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
    {
        error!("Failed to register message listener: {:?}", e);
        return;
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
}

/// Event representing an incoming RPC message from the host.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    channel: Res<RpcChannel>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    for message_str in channel.drain_incoming() {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// World access needed by the RPC method handlers.
#[derive(SystemParam)]
pub struct RpcContext<'w> {
    diagnostics: Res<'w, DiagnosticsStore>,
    feed: Res<'w, PointFeed>,
    active: ResMut<'w, ViewerActive>,
    state: Res<'w, State<ViewerState>>,
    buffer: Option<Res<'w, PointBuffer>>,
    frame_loop: Res<'w, FrameLoop>,
    lifecycle: EventWriter<'w, ViewerLifecycleEvent>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut context: RpcContext,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &mut context) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("Discarding malformed RPC message: {}", parse_error);
                rpc_interface.queue_response(create_error_response(
                    serde_json::Value::Null,
                    -32700,
                    "Parse error",
                    None,
                ));
            }
        }
    }
}

/// Run one request. Notifications (no id) are executed but never answered.
fn handle_rpc_request(request: &RpcRequest, context: &mut RpcContext) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "update_points" => {
            let limit = context
                .buffer
                .as_deref()
                .map_or(MAX_POINT_CAPACITY, PointBuffer::capacity_limit);
            handle_update_points(&request.params, &context.feed, limit)
        }
        "set_active" => handle_set_active(&request.params, &mut context.active),
        "mount" => handle_lifecycle(ViewerLifecycleEvent::Mount, &mut context.lifecycle),
        "unmount" => handle_lifecycle(ViewerLifecycleEvent::Unmount, &mut context.lifecycle),
        "get_status" => handle_get_status(context),
        "get_fps" => handle_get_fps(&context.diagnostics),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            return request.id.clone().map(|id| {
                create_error_response(
                    id,
                    -32601,
                    "Method not found",
                    Some(serde_json::json!({"method": request.method})),
                )
            });
        }
    };

    if let Err(error) = &result {
        warn!("RPC {} failed: {}", request.method, error.message);
    }

    let id = request.id.clone()?;
    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

/// Hand a flat xyz snapshot to the point feed. Empty arrays are accepted as
/// "nothing new".
fn handle_update_points(
    params: &serde_json::Value,
    feed: &PointFeed,
    capacity_limit: usize,
) -> Result<serde_json::Value, RpcError> {
    #[derive(serde::Deserialize)]
    struct UpdatePointsParams {
        points: Vec<f32>,
    }

    let update = serde_json::from_value::<UpdatePointsParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'points' array of numbers"))?;

    if update.points.len() % 3 != 0 {
        return Err(RpcError::invalid_params(&format!(
            "'points' length {} is not a multiple of 3",
            update.points.len()
        )));
    }

    let point_count = update.points.len() / 3;
    if point_count > capacity_limit {
        return Err(RpcError::invalid_params(&format!(
            "{point_count} points exceed the capacity limit of {capacity_limit}"
        )));
    }
    feed.submit(update.points);

    Ok(serde_json::json!({
        "success": true,
        "points": point_count
    }))
}

fn handle_set_active(
    params: &serde_json::Value,
    active: &mut ViewerActive,
) -> Result<serde_json::Value, RpcError> {
    #[derive(serde::Deserialize)]
    struct SetActiveParams {
        active: bool,
    }

    let parsed = serde_json::from_value::<SetActiveParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'active' boolean"))?;

    if active.0 != parsed.active {
        active.0 = parsed.active;
        info!("Viewer marked {}", if parsed.active { "active" } else { "inactive" });
    }

    Ok(serde_json::json!({
        "success": true,
        "active": parsed.active
    }))
}

fn handle_lifecycle(
    command: ViewerLifecycleEvent,
    lifecycle: &mut EventWriter<ViewerLifecycleEvent>,
) -> Result<serde_json::Value, RpcError> {
    lifecycle.write(command);
    Ok(serde_json::json!({
        "success": true
    }))
}

fn handle_get_status(context: &RpcContext) -> Result<serde_json::Value, RpcError> {
    let status = ViewerStatus::collect(
        *context.state.get(),
        *context.active,
        context.buffer.as_deref(),
        &context.frame_loop,
        &context.diagnostics,
    );

    serde_json::to_value(status)
        .map_err(|e| RpcError::internal_error(&format!("Failed to serialise status: {e}")))
}

/// Handle FPS retrieval with diagnostic system integration.
fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<serde_json::Value, RpcError> {
    let fps = smoothed_fps(diagnostics).unwrap_or(0.0) as f32;

    Ok(serde_json::json!({
        "fps": fps
    }))
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the host.
fn send_outgoing_messages(
    mut rpc_interface: ResMut<WebRpcInterface>,
    channel: Res<RpcChannel>,
) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_host(&notification, &channel);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_host(&response, &channel);
    }
}

/// Serialise and deliver one message to the host.
fn send_message_to_host<T: Serialize>(message: &T, channel: &RpcChannel) {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message: {}", e);
            return;
        }
    };

    #[cfg(target_arch = "wasm32")]
    {
        let _ = channel;
        if let Some(window) = window() {
            if let Some(parent) = window.parent().ok().flatten() {
                if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                    error!("Failed to send message to parent: {:?}", e);
                }
            } else {
                warn!("No parent window available for message transmission");
            }
        } else {
            error!("Window object not available");
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    channel.push_outgoing(json);
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
