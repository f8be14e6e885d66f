//! The generated OpenAPI document stays well-formed.

use utoipa::OpenApi;

use portal_service::ApiDoc;

#[test]
fn test_openapi_document_renders() {
    let doc = ApiDoc::openapi();
    let json = serde_json::to_value(&doc).expect("openapi serializes");

    assert!(json["paths"]["/api/v1/auth/login"]["post"].is_object());
    assert!(json["paths"]["/api/v1/superuser/users/{id}"]["get"].is_object());
    assert!(json["paths"]["/api/v1/superuser/tiers/{name}"]["get"].is_object());
}

#[test]
fn test_person_upload_is_documented_as_multipart() {
    let doc = ApiDoc::openapi();
    let json = serde_json::to_value(&doc).expect("openapi serializes");

    let body = &json["paths"]["/api/v1/persons"]["post"]["requestBody"]["content"];
    assert!(body["multipart/form-data"].is_object(), "{}", body);
}
