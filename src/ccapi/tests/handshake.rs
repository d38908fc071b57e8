use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use ccapi::{
    connect, ApiVersion, CameraMode, CcapiError, ConnectorConfig, Endpoint, EndpointGroup,
    ErrorKind, HandshakeError, LoopbackCamera, Reply,
};

const ADDRESS: &str = "192.168.1.20";

fn v100() -> ApiVersion {
    ApiVersion::from("ver100")
}

fn v110() -> ApiVersion {
    ApiVersion::from("ver110")
}

fn camera() -> LoopbackCamera {
    LoopbackCamera::standard(ADDRESS, "Canon EOS R6")
}

async fn reason(camera: &LoopbackCamera) -> String {
    connect(camera, ADDRESS, &ConnectorConfig::default())
        .await
        .expect_err("handshake should fail")
        .to_string()
}

#[tokio::test]
async fn reachable_camera_without_network_api_starts_in_still_mode() {
    let camera = camera();
    let session = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap();
    assert_eq!(session.address(), ADDRESS);
    assert_eq!(session.device_model(), "Canon EOS R6");
    assert_eq!(session.mode(), CameraMode::Still);
    assert!(!session.capabilities().supports(EndpointGroup::NetworkSetting));
    assert_eq!(camera.hits(&v100(), EndpointGroup::DeviceInformation), 1);
    assert_eq!(camera.hits(&v100(), EndpointGroup::MovieMode), 1);
}

#[tokio::test]
async fn movie_mode_on_starts_in_video_mode() {
    let camera = camera();
    camera.set_reply(
        &v100(),
        EndpointGroup::MovieMode,
        Reply::payload(json!({"status": "on"})),
    );
    let session = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap();
    assert_eq!(session.mode(), CameraMode::Video);
}

#[tokio::test(start_paused = true)]
async fn slow_probe_is_reported_unreachable_after_four_seconds() {
    let camera = camera();
    camera.set_discover_delay(Duration::from_secs(30));
    let started = Instant::now();
    let err = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap_err();
    let elapsed = started.elapsed();
    assert_eq!(err.to_string(), "camera couldn't be reached");
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    assert_eq!(camera.hits(&v100(), EndpointGroup::DeviceInformation), 0);
}

#[tokio::test]
async fn unreachable_camera_is_reported() {
    let camera = camera();
    camera.set_reachable(false);
    let err = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HandshakeError::Unreachable(CcapiError::Unreachable(_))));
    assert_eq!(err.kind(), ErrorKind::Unreachable);
}

#[tokio::test]
async fn network_settings_append_endpoints_to_their_version() {
    let extra = Endpoint::readable(format!(
        "http://{ADDRESS}:8080/ccapi/ver110/functions/networksetting/connectionsetting"
    ));
    let camera = camera()
        .with_endpoint(&v110(), EndpointGroup::Polling, Reply::payload(json!({})))
        .with_endpoint(
            &v110(),
            EndpointGroup::NetworkSetting,
            Reply::payload(json!({ "ver110": [extra.clone()] })),
        );
    let session = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap();
    let listed = session.capabilities().endpoints(&v110());
    assert_eq!(listed.len(), 3);
    assert!(listed[0].belongs_to(&v110(), EndpointGroup::Polling));
    assert!(listed[1].belongs_to(&v110(), EndpointGroup::NetworkSetting));
    assert_eq!(listed[2], extra);
    assert_eq!(session.capabilities().endpoints(&v100()).len(), 3);
}

#[tokio::test]
async fn network_settings_without_listing_for_version_add_nothing() {
    let camera = camera().with_endpoint(
        &v110(),
        EndpointGroup::NetworkSetting,
        Reply::payload(json!({ "ver100": [] })),
    );
    let session = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap();
    assert_eq!(session.capabilities().endpoints(&v110()).len(), 1);
}

#[tokio::test]
async fn network_sub_resources_without_versions_are_empty() {
    let wifi = Endpoint::readable(format!(
        "http://{ADDRESS}:8080/ccapi/ver100/functions/networksetting/wifisetting"
    ));
    let camera = camera().with_listing(&v100(), wifi);
    let err = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err, HandshakeError::NetworkSettingVersionsEmpty);
    assert_eq!(err.to_string(), "network setting versions is empty");
    assert_eq!(camera.hits(&v100(), EndpointGroup::DeviceInformation), 0);
}

#[tokio::test]
async fn unreadable_network_api_is_undefined() {
    let mut listing = camera().endpoint(&v110(), EndpointGroup::NetworkSetting);
    listing.get = false;
    let camera = camera().with_listing(&v110(), listing);
    assert_eq!(reason(&camera).await, "network version is undefined");
    assert_eq!(camera.hits(&v100(), EndpointGroup::DeviceInformation), 0);
}

#[tokio::test]
async fn failing_network_settings_abort_the_handshake() {
    let camera = camera().with_endpoint(
        &v110(),
        EndpointGroup::NetworkSetting,
        Reply::error(CcapiError::Rejected {
            status: 503,
            message: "Device busy".into(),
        }),
    );
    assert_eq!(reason(&camera).await, "failed to get network settings");
}

#[tokio::test]
async fn missing_device_information_api_is_undefined() {
    let camera = LoopbackCamera::new(ADDRESS).with_endpoint(
        &v100(),
        EndpointGroup::MovieMode,
        Reply::payload(json!({"status": "off"})),
    );
    assert_eq!(reason(&camera).await, "device information version is undefined");
    assert_eq!(camera.hits(&v100(), EndpointGroup::MovieMode), 0);
}

#[tokio::test]
async fn device_information_failures_are_reported() {
    let camera = camera();
    camera.set_reply(
        &v100(),
        EndpointGroup::DeviceInformation,
        Reply::error(CcapiError::Rejected {
            status: 503,
            message: "Device busy".into(),
        }),
    );
    assert_eq!(reason(&camera).await, "failed to get device information");

    camera.set_reply(
        &v100(),
        EndpointGroup::DeviceInformation,
        Reply::payload(json!({"manufacturer": "Canon Inc."})),
    );
    let err = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to get device information");
    assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
}

#[tokio::test]
async fn missing_movie_mode_api_is_undefined() {
    let camera = LoopbackCamera::new(ADDRESS).with_endpoint(
        &v100(),
        EndpointGroup::DeviceInformation,
        Reply::payload(json!({"productname": "Canon EOS R6"})),
    );
    assert_eq!(reason(&camera).await, "movie mode version is undefined");
}

#[tokio::test(start_paused = true)]
async fn slow_movie_mode_times_out() {
    let camera = camera();
    camera.set_reply(
        &v100(),
        EndpointGroup::MovieMode,
        Reply::payload(json!({"status": "on"})).after(Duration::from_secs(60)),
    );
    let err = connect(&camera, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to get movie mode");
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn repeated_connects_describe_the_same_device() {
    let camera = camera();
    let config = ConnectorConfig::default();
    let first = connect(&camera, ADDRESS, &config).await.unwrap();
    camera.set_reply(
        &v100(),
        EndpointGroup::MovieMode,
        Reply::payload(json!({"status": "on"})),
    );
    let second = connect(&camera, ADDRESS, &config).await.unwrap();
    assert!(first.same_device(&second));
    assert_ne!(first.id(), second.id());
    assert_ne!(first.mode(), second.mode());
    assert_eq!(camera.discoveries(), 2);
}

#[tokio::test]
async fn connect_accepts_trait_objects() {
    let camera = camera();
    let client: &dyn ccapi::CcapiClient = &camera;
    let session = connect(client, ADDRESS, &ConnectorConfig::default())
        .await
        .unwrap();
    assert_eq!(session.device_model(), "Canon EOS R6");
}
