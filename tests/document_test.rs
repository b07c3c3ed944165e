mod common;

use std::path::Path;

use axum::http::StatusCode;
use serde_json::json;

use common::{empty_request, get, json_request, multipart_request, spawn_app, Part, TestApp};
use ledblast::domain::Role;

const PDF: &[u8] = b"%PDF-1.4\n% fake invoice\n\x00\x01\x02binary tail";

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

fn documents_dir(app: &TestApp) -> std::path::PathBuf {
    app.dir.path().join("uploaded_documents")
}

#[tokio::test]
async fn upload_download_and_delete_document() {
    let app = spawn_app().await;
    let (_, editor) = app.user_with_role("editor", Role::Editor).await;
    let (_, admin) = app.user_with_role("boss", Role::Admin).await;

    let (status, supplier) = app
        .send(json_request(
            "POST",
            "/api/suppliers",
            Some(&editor),
            json!({ "name": "Acme" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let supplier_id = supplier["id"].to_string();

    let (status, doc) = app
        .send(multipart_request(
            "/api/documents",
            &editor,
            &[
                Part::Text("title", "Invoice March"),
                Part::Text("category", "Factură"),
                Part::Text("supplier_id", &supplier_id),
                Part::Text("product_id", ""),
                Part::File {
                    name: "file",
                    file_name: "invoice march.pdf",
                    bytes: PDF,
                },
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", doc);
    assert_eq!(doc["title"], "Invoice March");
    assert_eq!(doc["category"], "Factură");
    assert_eq!(doc["file_size"], PDF.len());
    assert!(doc["file_name"].as_str().unwrap().ends_with("_invoice_march.pdf"));

    let path = doc["file_path"].as_str().unwrap().to_string();
    assert_eq!(std::fs::read(&path).unwrap(), PDF);
    assert_eq!(files_in(&documents_dir(&app)), 1);

    let (_, body) = app.send(get("/api/documents", &editor)).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["categories"].as_array().unwrap().len(), 5);
    let (_, body) = app
        .send(get(&format!("/api/documents?supplier_id={}", supplier_id), &editor))
        .await;
    assert_eq!(body["total"], 1);

    let id = doc["id"].as_i64().unwrap();
    let (status, bytes) = app
        .send_raw(get(&format!("/api/documents/{}/file", id), &editor))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, PDF);

    // Only admins delete
    let (status, _) = app
        .send(empty_request("DELETE", &format!("/api/documents/{}", id), Some(&editor)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(empty_request("DELETE", &format!("/api/documents/{}", id), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!Path::new(&path).exists());
    let (status, _) = app.send(get(&format!("/api/documents/{}", id), &editor)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejected_uploads_leave_nothing_behind() {
    let app = spawn_app().await;
    let (_, editor) = app.user_with_role("editor", Role::Editor).await;

    let (status, _) = app
        .send(multipart_request(
            "/api/documents",
            &editor,
            &[
                Part::Text("title", "Script"),
                Part::File {
                    name: "file",
                    file_name: "payload.exe",
                    bytes: b"MZ",
                },
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(multipart_request(
            "/api/documents",
            &editor,
            &[Part::File {
                name: "file",
                file_name: "datasheet.pdf",
                bytes: PDF,
            }],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");

    let (status, _) = app
        .send(multipart_request(
            "/api/documents",
            &editor,
            &[
                Part::Text("title", "Orphan"),
                Part::Text("product_id", "77"),
                Part::File {
                    name: "file",
                    file_name: "datasheet.pdf",
                    bytes: PDF,
                },
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.send(get("/api/documents", &editor)).await;
    assert_eq!(body["total"], 0);
    assert_eq!(files_in(&documents_dir(&app)), 0);
}

#[tokio::test]
async fn viewers_cannot_upload() {
    let app = spawn_app().await;
    let (_, viewer) = app.user_with_role("viewer", Role::Viewer).await;

    let (status, _) = app
        .send(multipart_request(
            "/api/documents",
            &viewer,
            &[
                Part::Text("title", "Nope"),
                Part::File {
                    name: "file",
                    file_name: "datasheet.pdf",
                    bytes: PDF,
                },
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(files_in(&documents_dir(&app)), 0);
}

#[tokio::test]
async fn product_image_upload_and_fetch() {
    let app = spawn_app().await;
    let (_, editor) = app.user_with_role("editor", Role::Editor).await;

    let (_, product) = app
        .send(json_request(
            "POST",
            "/api/products",
            Some(&editor),
            json!({ "sku": "P10", "name": "P10 module" }),
        ))
        .await;
    let id = product["id"].as_i64().unwrap();
    let uri = format!("/api/products/{}/image", id);

    let (status, _) = app.send(get(&uri, &editor)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(multipart_request(
            &uri,
            &editor,
            &[Part::File {
                name: "file",
                file_name: "photo.gif",
                bytes: b"GIF89a",
            }],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let png: &[u8] = b"\x89PNG\r\n\x1a\nnot really";
    let (status, body) = app
        .send(multipart_request(
            &uri,
            &editor,
            &[Part::File {
                name: "file",
                file_name: "Photo.PNG",
                bytes: png,
            }],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["image_path"]
        .as_str()
        .unwrap()
        .ends_with(&format!("product_{}.png", id)));

    let (status, bytes) = app.send_raw(get(&uri, &editor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, png);
}

#[tokio::test]
async fn audit_trail_records_uploads_and_exports_csv() {
    let app = spawn_app().await;
    let (editor_id, editor) = app.user_with_role("editor", Role::Editor).await;
    let (_, admin) = app.user_with_role("boss", Role::Admin).await;

    let (status, _) = app
        .send(multipart_request(
            "/api/documents",
            &editor,
            &[
                Part::Text("title", "Datasheet"),
                Part::Text("category", "Specificații"),
                Part::File {
                    name: "file",
                    file_name: "p10.pdf",
                    bytes: PDF,
                },
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.send(get("/api/audit", &editor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(get(&format!("/api/audit?user_id={}", editor_id), &admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["entries"][0]["action_type"], "UPLOAD");
    assert_eq!(body["entries"][0]["table_name"], "documents");

    let (status, bytes) = app
        .send_raw(get("/api/audit/export?action_type=UPLOAD", &admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("id,"));
    let row = lines.next().unwrap();
    assert!(row.contains("UPLOAD"));
    assert!(row.contains("p10.pdf"));
    assert_eq!(lines.next(), None);

    // The export itself is audited
    let (_, body) = app.send(get("/api/audit?action_type=EXPORT", &admin)).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn delete_succeeds_when_the_file_cannot_be_removed() {
    let app = spawn_app().await;
    let (_, editor) = app.user_with_role("editor", Role::Editor).await;
    let (_, admin) = app.user_with_role("boss", Role::Admin).await;

    let (status, doc) = app
        .send(multipart_request(
            "/api/documents",
            &editor,
            &[
                Part::Text("title", "Stuck file"),
                Part::Text("category", "Altele"),
                Part::File {
                    name: "file",
                    file_name: "stuck.pdf",
                    bytes: PDF,
                },
            ],
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", doc);

    // A directory in place of the file makes the unlink fail
    let path = doc["file_path"].as_str().unwrap().to_string();
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let id = doc["id"].as_i64().unwrap();
    let (status, _) = app
        .send(empty_request("DELETE", &format!("/api/documents/{}", id), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(get(&format!("/api/documents/{}", id), &editor)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .send(get("/api/audit?action_type=DELETE", &admin))
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["entries"][0]["record_id"], id);
}
