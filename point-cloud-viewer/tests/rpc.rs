mod common;

use serde_json::{Value, json};

use common::{CAPACITY, mounted_app, state, update_n, viewer_app};
use point_cloud_viewer::engine::buffer::point_buffer::PointBuffer;
use point_cloud_viewer::engine::buffer::point_feed::PointFeed;
use point_cloud_viewer::engine::core::app_state::{ViewerActive, ViewerState};
use point_cloud_viewer::rpc::web_rpc::RpcChannel;

fn call(app: &mut bevy::app::App, message: Value) -> Vec<Value> {
    let channel = app.world().resource::<RpcChannel>().clone();
    channel.push_incoming(message.to_string());
    app.update();
    channel
        .drain_outgoing()
        .iter()
        .map(|raw| serde_json::from_str(raw).expect("outgoing message is json"))
        .collect()
}

fn response(messages: &[Value], id: i64) -> &Value {
    messages
        .iter()
        .find(|message| message["id"] == json!(id))
        .expect("response with matching id")
}

fn notifications<'a>(messages: &'a [Value], method: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter(|message| message["method"] == json!(method))
        .collect()
}

#[test]
fn get_status_reports_running_viewer() {
    let mut app = mounted_app(640, 480);
    let messages = call(
        &mut app,
        json!({"jsonrpc": "2.0", "method": "get_status", "id": 1}),
    );

    let result = &response(&messages, 1)["result"];
    assert_eq!(result["state"], "running");
    assert_eq!(result["is_active"], false);
    assert_eq!(result["capacity"], CAPACITY);
    assert_eq!(result["draw_count"], 0);
}

#[test]
fn update_points_notification_is_drawn_the_same_frame() {
    let mut app = mounted_app(640, 480);
    let messages = call(
        &mut app,
        json!({
            "jsonrpc": "2.0",
            "method": "update_points",
            "params": {"points": [0.0, 0.0, 0.0, 1.0, 1.0, 1.0]}
        }),
    );

    assert!(messages.iter().all(|message| message.get("id").is_none()));
    assert_eq!(app.world().resource::<PointBuffer>().draw_count(), 2);
}

#[test]
fn misaligned_update_is_invalid_params() {
    let mut app = mounted_app(640, 480);
    let messages = call(
        &mut app,
        json!({
            "jsonrpc": "2.0",
            "method": "update_points",
            "params": {"points": [0.0, 1.0]},
            "id": 7
        }),
    );

    assert_eq!(response(&messages, 7)["error"]["code"], -32602);
    assert!(!app.world().resource::<PointFeed>().has_pending());
    assert_eq!(app.world().resource::<PointBuffer>().draw_count(), 0);
}

#[test]
fn unknown_method_and_bad_json() {
    let mut app = viewer_app(640, 480);
    let messages = call(
        &mut app,
        json!({"jsonrpc": "2.0", "method": "reset_everything", "id": 3}),
    );
    assert_eq!(response(&messages, 3)["error"]["code"], -32601);

    let channel = app.world().resource::<RpcChannel>().clone();
    channel.push_incoming("{not json");
    app.update();
    let replies: Vec<Value> = channel
        .drain_outgoing()
        .iter()
        .filter_map(|raw| serde_json::from_str(raw).ok())
        .collect();
    let parse_error = replies
        .iter()
        .find(|message| message["error"]["code"] == json!(-32700))
        .expect("parse error response");
    assert_eq!(parse_error["id"], Value::Null);
}

#[test]
fn set_active_is_reported_without_pausing() {
    let mut app = mounted_app(640, 480);
    app.world().resource::<RpcChannel>().drain_outgoing();

    let messages = call(
        &mut app,
        json!({"jsonrpc": "2.0", "method": "set_active", "params": {"active": true}, "id": 2}),
    );

    assert_eq!(response(&messages, 2)["result"]["active"], true);
    let status = notifications(&messages, "viewer_status");
    assert_eq!(status.len(), 1);
    assert_eq!(status[0]["params"]["is_active"], true);
    assert_eq!(status[0]["params"]["state"], "running");
    assert!(app.world().resource::<ViewerActive>().0);

    call(
        &mut app,
        json!({"jsonrpc": "2.0", "method": "set_active", "params": {"active": false}}),
    );
    assert_eq!(state(&app), ViewerState::Running);
}

#[test]
fn mount_and_unmount_over_rpc() {
    let mut app = viewer_app(640, 480);
    call(&mut app, json!({"jsonrpc": "2.0", "method": "mount"}));
    update_n(&mut app, 2);
    assert_eq!(state(&app), ViewerState::Running);

    let mut messages = call(
        &mut app,
        json!({"jsonrpc": "2.0", "method": "unmount", "id": 9}),
    );
    assert_eq!(response(&messages, 9)["result"]["success"], true);

    let channel = app.world().resource::<RpcChannel>().clone();
    app.update();
    messages.extend(
        channel
            .drain_outgoing()
            .iter()
            .filter_map(|raw| serde_json::from_str::<Value>(raw).ok()),
    );

    assert_eq!(state(&app), ViewerState::Stopped);
    assert!(
        notifications(&messages, "viewer_status")
            .iter()
            .any(|status| status["params"]["state"] == "stopped")
    );
}

#[test]
fn misaligned_feed_snapshot_reaches_host_as_warning() {
    let mut app = mounted_app(640, 480);
    let channel = app.world().resource::<RpcChannel>().clone();
    channel.drain_outgoing();

    app.world().resource::<PointFeed>().submit(vec![0.0; 5]);
    app.update();

    let messages: Vec<Value> = channel
        .drain_outgoing()
        .iter()
        .filter_map(|raw| serde_json::from_str(raw).ok())
        .collect();
    let warnings = notifications(&messages, "viewer_warning");
    assert_eq!(warnings.len(), 1);
    assert!(
        warnings[0]["params"]["message"]
            .as_str()
            .is_some_and(|message| message.contains('5'))
    );
}
