use api_contract::ApiResponse;

#[test]
fn api_response_success() {
    let response = ApiResponse::success("ok");
    assert!(response.success);
    assert!(response.data.is_some());
    assert!(response.error.is_none());
}

#[test]
fn api_response_error() {
    let response = ApiResponse::<()>::error("SESSION.BUSY", "session busy: connecting");
    assert!(!response.success);
    assert!(response.data.is_none());
    let error = response.error.expect("error");
    assert_eq!(error.code, "SESSION.BUSY");
}

#[test]
fn api_response_serializes_envelope() {
    let value = serde_json::to_value(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found"))
        .expect("serialize");
    assert_eq!(value["success"], false);
    assert!(value["data"].is_null());
    assert_eq!(value["error"]["code"], "RESOURCE.NOT_FOUND");
}
