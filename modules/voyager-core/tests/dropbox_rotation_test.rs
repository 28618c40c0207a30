//! Folder rotation through the real Dropbox client against wiremock.

use dropbox_client::DropboxClient;
use serde_json::json;
use voyager_core::{FolderAllocator, FolderLayout};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn folder(name: &str) -> serde_json::Value {
    json!({ ".tag": "folder", "name": name, "id": format!("id:{name}") })
}

fn files(range: std::ops::Range<usize>) -> Vec<serde_json::Value> {
    range
        .map(|i| json!({ ".tag": "file", "name": format!("{i}.jpg"), "id": format!("id:{i}") }))
        .collect()
}

#[tokio::test]
async fn capacity_above_one_page_still_rotates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .and(body_partial_json(json!({ "path": "" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [folder("captcha")],
            "cursor": "root",
            "has_more": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .and(body_partial_json(json!({ "path": "/captcha" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": files(0..2000),
            "cursor": "captcha-2",
            "has_more": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/list_folder/continue"))
        .and(body_json(json!({ "cursor": "captcha-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": files(2000..2500),
            "cursor": "captcha-3",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/create_folder_v2"))
        .and(body_json(json!({ "path": "/1-captcha", "autorename": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": { "name": "1-captcha", "id": "id:new", "path_display": "/1-captcha" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DropboxClient::new("tok").with_base_url(&server.uri());
    let layout = FolderLayout::new("", "captcha", 2500);

    let allocated = FolderAllocator::new(&client, &layout).allocate().await;

    assert_eq!(allocated.path, "/1-captcha");
    assert_eq!(allocated.ordinal, 1);
}

#[tokio::test]
async fn highest_ordinal_on_a_later_root_page_is_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .and(body_partial_json(json!({ "path": "" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [folder("captcha"), folder("1-captcha")],
            "cursor": "root-2",
            "has_more": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/list_folder/continue"))
        .and(body_json(json!({ "cursor": "root-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [folder("2-captcha")],
            "cursor": "root-3",
            "has_more": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .and(body_partial_json(json!({ "path": "/2-captcha" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": files(0..3),
            "cursor": "two",
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DropboxClient::new("tok").with_base_url(&server.uri());
    let layout = FolderLayout::new("", "captcha", 10);

    let allocated = FolderAllocator::new(&client, &layout).allocate().await;

    assert_eq!(allocated.path, "/2-captcha");
    assert_eq!(allocated.file_count, 3);
}
