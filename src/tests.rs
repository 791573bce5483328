//! Integration tests for the party backend.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::MEMBER_ID_HEADER;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::models::{CreateMemberRequest, Role};
use crate::{create_router, AppState};

const ADMIN_NAME: &str = "幹事 毅";
const ADMIN_BIRTHDAY: &str = "0101";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    admin_id: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(None).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let admin = repo
            .create_member(&CreateMemberRequest {
                name: ADMIN_NAME.to_string(),
                first_name: "毅".to_string(),
                birthday: ADMIN_BIRTHDAY.to_string(),
                role: Role::Admin,
            })
            .await
            .expect("Failed to seed admin");

        let config = Config {
            api_psk: psk,
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            admin_seed: None,
        };

        let state = AppState {
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            admin_id: admin.id,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, member_id: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .header(MEMBER_ID_HEADER, member_id)
    }

    fn post(&self, path: &str, member_id: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header(MEMBER_ID_HEADER, member_id)
    }

    fn put(&self, path: &str, member_id: &str) -> RequestBuilder {
        self.client
            .put(self.url(path))
            .header(MEMBER_ID_HEADER, member_id)
    }

    fn delete(&self, path: &str, member_id: &str) -> RequestBuilder {
        self.client
            .delete(self.url(path))
            .header(MEMBER_ID_HEADER, member_id)
    }

    /// Register an attendee through the roster API and return their id.
    async fn register(&self, name: &str, first_name: &str, birthday: &str) -> String {
        let resp = self
            .post("/api/admin/members", &self.admin_id)
            .json(&json!({
                "name": name,
                "firstName": first_name,
                "birthday": birthday
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_psk_gate() {
    let fixture = TestFixture::with_psk(Some("party-key".to_string())).await;

    // Missing key
    let resp = fixture
        .client
        .get(fixture.url("/api/meal/options"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Wrong key
    let resp = fixture
        .client
        .get(fixture.url("/api/meal/options"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Header key
    let resp = fixture
        .client
        .get(fixture.url("/api/meal/options"))
        .header("x-api-key", "party-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Bearer key
    let resp = fixture
        .client
        .get(fixture.url("/api/meal/options"))
        .bearer_auth("party-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Health stays open
    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_login() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/session/login"))
        .json(&json!({ "name": " 山田 太郎 ", "birthday": "0205" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["memberId"], member_id.as_str());
    assert_eq!(body["data"]["role"], "member");
    assert_eq!(body["data"]["firstName"], "太郎");

    let resp = fixture
        .client
        .post(fixture.url("/api/session/login"))
        .json(&json!({ "name": ADMIN_NAME, "birthday": ADMIN_BIRTHDAY }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "admin");

    // Wrong birthday and unknown name fail the same way
    let wrong_birthday = fixture
        .client
        .post(fixture.url("/api/session/login"))
        .json(&json!({ "name": "山田 太郎", "birthday": "0206" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_birthday.status(), 401);
    let wrong_birthday: Value = wrong_birthday.json().await.unwrap();

    let unknown_name = fixture
        .client
        .post(fixture.url("/api/session/login"))
        .json(&json!({ "name": "佐藤 花子", "birthday": "0205" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_name.status(), 401);
    let unknown_name: Value = unknown_name.json().await.unwrap();

    assert_eq!(wrong_birthday["error"]["code"], "UNAUTHORIZED");
    assert_eq!(
        wrong_birthday["error"]["message"],
        unknown_name["error"]["message"]
    );
}

#[tokio::test]
async fn test_session_required() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/meal"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = fixture
        .get("/api/session/home", "no-such-member")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Public routes need no session
    let resp = fixture
        .client
        .get(fixture.url("/api/meal/options"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["alcohols"].as_array().unwrap().len(), 6);
    assert_eq!(body["data"]["drinkTypes"], json!(["soft", "alcohol"]));
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_members() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;

    for path in ["/api/admin/members", "/api/admin/meal", "/api/admin/meal/summary"] {
        let resp = fixture.get(path, &member_id).send().await.unwrap();
        assert_eq!(resp.status(), 403, "{}", path);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    let resp = fixture
        .put("/api/admin/schedules", &member_id)
        .json(&json!({ "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_home_schedule_fallback() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;

    let resp = fixture
        .get("/api/session/home", &member_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["firstName"], "太郎");
    assert_eq!(body["data"]["isAdmin"], false);
    let schedule = body["data"]["schedule"].as_array().unwrap();
    assert_eq!(schedule.len(), 4);
    assert_eq!(schedule[0]["time"], "18:00");
    assert_eq!(schedule[0]["title"], "開宴・乾杯");

    // Raw listing has no fallback
    let resp = fixture.get("/api/schedules", &member_id).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    // Once organizers save a schedule it replaces the default
    fixture
        .put("/api/admin/schedules", &fixture.admin_id)
        .json(&json!({
            "items": [
                { "timeStart": "19:00", "title": "ビンゴ大会" },
                { "timeStart": "18:15", "title": "乾杯", "description": "飲みすぎ注意" }
            ]
        }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .get("/api/session/home", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["isAdmin"], true);
    let schedule = body["data"]["schedule"].as_array().unwrap();
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule[0]["title"], "乾杯");
    assert_eq!(schedule[0]["description"], "飲みすぎ注意");
    assert_eq!(schedule[1]["time"], "19:00");
}

#[tokio::test]
async fn test_meal_preference_upsert() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;

    // Nothing submitted yet
    let resp = fixture.get("/api/meal", &member_id).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());

    let resp = fixture
        .put("/api/meal", &member_id)
        .json(&json!({
            "hasAllergy": true,
            "allergyDetails": "エビ",
            "drinkType": "alcohol",
            "favoriteAlcohols": ["ビール", "ハイボール", "ビール"],
            "alcoholAmount": "たくさん！",
            "foodCategories": ["スイーツ"],
            "foodRequest": "ファミチキ"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["favoriteAlcohols"], json!(["ビール", "ハイボール"]));

    // Second save replaces the first
    let resp = fixture
        .put("/api/meal", &member_id)
        .json(&json!({
            "hasAllergy": false,
            "allergyDetails": "エビ",
            "drinkType": "soft",
            "favoriteAlcohols": ["ビール"],
            "favoriteSoftDrinks": ["お茶"],
            "foodCategories": []
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture.get("/api/meal", &member_id).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let pref = &body["data"];
    assert_eq!(pref["hasAllergy"], false);
    assert!(pref["allergyDetails"].is_null());
    assert_eq!(pref["drinkType"], "soft");
    assert_eq!(pref["favoriteAlcohols"], json!([]));
    assert_eq!(pref["favoriteSoftDrinks"], json!(["お茶"]));
    assert!(pref["foodRequest"].is_null());

    // Still one row for this member
    let resp = fixture
        .get("/api/admin/meal", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["memberName"], "山田 太郎");
}

#[tokio::test]
async fn test_meal_preference_validation() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;

    let resp = fixture
        .put("/api/meal", &member_id)
        .json(&json!({ "drinkType": "juice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .put("/api/meal", &member_id)
        .json(&json!({ "drinkType": "soft", "favoriteSoftDrinks": ["日本酒"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Nothing was stored
    let resp = fixture.get("/api/meal", &member_id).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_song_requests() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;

    let resp = fixture
        .post("/api/requests", &member_id)
        .json(&json!({ "songTitle": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .post("/api/requests", &member_id)
        .json(&json!({ "songTitle": "旅立ちの日に", "artistName": "", "message": "ありがとう！" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["memberName"], "山田 太郎");
    assert!(body["data"]["artistName"].is_null());
    let first_id = body["data"]["id"].as_str().unwrap().to_string();

    fixture
        .post("/api/requests", &fixture.admin_id)
        .json(&json!({ "songTitle": "さくら", "artistName": "森山直太朗" }))
        .send()
        .await
        .unwrap();

    let resp = fixture.get("/api/requests", &member_id).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let requests = body["data"].as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["songTitle"], "さくら");
    assert_eq!(requests[0]["firstName"], "毅");
    assert_eq!(requests[1]["firstName"], "太郎");
    assert_eq!(requests[1]["message"], "ありがとう！");

    // Only organizers moderate
    let resp = fixture
        .delete(&format!("/api/admin/requests/{}", first_id), &member_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = fixture
        .delete(&format!("/api/admin/requests/{}", first_id), &fixture.admin_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .delete(&format!("/api/admin/requests/{}", first_id), &fixture.admin_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture.get("/api/requests", &member_id).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_roster_management() {
    let fixture = TestFixture::new().await;
    let taro = fixture.register("山田 太郎", "太郎", "0205").await;
    fixture.register("佐藤 花子", "花子", "1111").await;

    // Duplicate name + birthday
    let resp = fixture
        .post("/api/admin/members", &fixture.admin_id)
        .json(&json!({ "name": "山田 太郎", "firstName": "太郎", "birthday": "0205" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");

    // Blank fields
    let resp = fixture
        .post("/api/admin/members", &fixture.admin_id)
        .json(&json!({ "name": "", "firstName": "x", "birthday": "0101" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    fixture
        .put("/api/meal", &taro)
        .json(&json!({ "drinkType": "soft" }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .get("/api/admin/members", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let members = body["data"].as_array().unwrap();
    assert_eq!(members.len(), 3);
    assert!(members.iter().all(|m| m.get("birthday").is_none()));
    let taro_row = members.iter().find(|m| m["id"] == taro.as_str()).unwrap();
    assert_eq!(taro_row["hasMealPreference"], true);
    assert_eq!(taro_row["isPresent"], false);

    // Substring search on name or first name
    let resp = fixture
        .get("/api/admin/members?q=花子", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "佐藤 花子");
    assert_eq!(found[0]["hasMealPreference"], false);

    // Attendance
    let resp = fixture
        .put(&format!("/api/admin/members/{}/presence", taro), &fixture.admin_id)
        .json(&json!({ "isPresent": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["isPresent"], true);

    let resp = fixture
        .put("/api/admin/members/missing/presence", &fixture.admin_id)
        .json(&json!({ "isPresent": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_member_deletion_cascades() {
    let fixture = TestFixture::new().await;
    let taro = fixture.register("山田 太郎", "太郎", "0205").await;

    fixture
        .put("/api/meal", &taro)
        .json(&json!({ "drinkType": "alcohol", "favoriteAlcohols": ["梅酒"] }))
        .send()
        .await
        .unwrap();
    fixture
        .post("/api/requests", &taro)
        .json(&json!({ "songTitle": "栄光の架橋" }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .delete(&format!("/api/admin/members/{}", taro), &fixture.admin_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Their session is gone
    let resp = fixture.get("/api/meal", &taro).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    // Preference removed
    let resp = fixture
        .get("/api/admin/meal", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    // Request kept, attribution cleared
    let resp = fixture
        .get("/api/requests", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let requests = body["data"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]["memberId"].is_null());
    assert!(requests[0]["firstName"].is_null());
    assert_eq!(requests[0]["memberName"], "山田 太郎");
}

#[tokio::test]
async fn test_schedule_editor() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_id.clone();

    let resp = fixture
        .put("/api/admin/schedules", &admin)
        .json(&json!({
            "items": [
                { "timeStart": "20:00", "title": "プレゼント贈呈" },
                { "timeStart": "9:30", "title": "会場設営" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["timeStart"], "09:30");
    assert_eq!(items[1]["timeStart"], "20:00");
    let setup_id = items[0]["id"].as_str().unwrap().to_string();
    let gift_id = items[1]["id"].as_str().unwrap().to_string();

    // Edit an existing row and add one
    let resp = fixture
        .put("/api/admin/schedules", &admin)
        .json(&json!({
            "items": [
                { "id": setup_id, "timeStart": "17:30", "title": "会場設営", "description": "全員集合" },
                { "timeStart": "18:00", "title": "開宴" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["id"], setup_id.as_str());
    assert_eq!(items[0]["description"], "全員集合");
    assert_eq!(items[1]["title"], "開宴");

    // Bad time
    let resp = fixture
        .put("/api/admin/schedules", &admin)
        .json(&json!({ "items": [{ "timeStart": "夕方", "title": "x" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Unknown id rolls back the whole save
    let resp = fixture
        .put("/api/admin/schedules", &admin)
        .json(&json!({
            "items": [
                { "timeStart": "21:00", "title": "二次会" },
                { "id": "missing", "timeStart": "21:30", "title": "x" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture.get("/api/schedules", &admin).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    // Delete
    let resp = fixture
        .delete(&format!("/api/admin/schedules/{}", gift_id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture.get("/api/schedules", &admin).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_meal_summary() {
    let fixture = TestFixture::new().await;
    let taro = fixture.register("山田 太郎", "太郎", "0205").await;
    let hanako = fixture.register("佐藤 花子", "花子", "1111").await;
    fixture.register("鈴木 一郎", "一郎", "0707").await;

    fixture
        .put("/api/meal", &taro)
        .json(&json!({
            "hasAllergy": true,
            "allergyDetails": "そば",
            "drinkType": "alcohol",
            "favoriteAlcohols": ["ハイボール", "ビール"],
            "alcoholAmount": "ほどほどに",
            "foodCategories": ["アイス", "スイーツ"]
        }))
        .send()
        .await
        .unwrap();
    fixture
        .put("/api/meal", &hanako)
        .json(&json!({
            "drinkType": "alcohol",
            "favoriteAlcohols": ["ビール"],
            "foodCategories": ["スイーツ"],
            "foodRequest": "じゃがりこ"
        }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .get("/api/admin/meal/summary", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let summary = &body["data"];

    assert_eq!(summary["respondents"], 2);
    assert_eq!(summary["totalMembers"], 4);
    assert_eq!(summary["unanswered"], json!([ADMIN_NAME, "鈴木 一郎"]));
    assert_eq!(summary["drinkTypes"]["alcohol"], 2);
    assert_eq!(summary["drinkTypes"]["soft"], 0);
    assert_eq!(
        summary["alcohols"],
        json!([
            { "item": "ビール", "count": 2 },
            { "item": "ハイボール", "count": 1 }
        ])
    );
    assert_eq!(
        summary["foodCategories"],
        json!([
            { "item": "スイーツ", "count": 2 },
            { "item": "アイス", "count": 1 }
        ])
    );
    assert_eq!(
        summary["alcoholAmounts"],
        json!([{ "item": "ほどほどに", "count": 1 }])
    );
    assert_eq!(
        summary["allergies"],
        json!([{ "name": "山田 太郎", "details": "そば" }])
    );
    assert_eq!(
        summary["foodRequests"],
        json!([{ "name": "佐藤 花子", "text": "じゃがりこ" }])
    );
}

#[tokio::test]
async fn test_revision_increments_on_writes() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/revision"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let initial = body["data"]["revisionId"].as_i64().unwrap();

    let resp = fixture
        .post("/api/admin/members", &fixture.admin_id)
        .json(&json!({ "name": "山田 太郎", "firstName": "太郎", "birthday": "0205" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"].as_i64().unwrap(), initial + 1);
    let taro = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .put("/api/meal", &taro)
        .json(&json!({ "drinkType": "soft" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"].as_i64().unwrap(), initial + 2);

    // A multi-row schedule save counts once
    let resp = fixture
        .put("/api/admin/schedules", &fixture.admin_id)
        .json(&json!({
            "items": [
                { "timeStart": "18:00", "title": "乾杯" },
                { "timeStart": "19:00", "title": "歓談" }
            ]
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"].as_i64().unwrap(), initial + 3);

    // Reads do not bump
    let resp = fixture.get("/api/requests", &taro).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"].as_i64().unwrap(), initial + 3);
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;

    // Missing required field
    let resp = fixture
        .post("/api/requests", &member_id)
        .json(&json!({ "artistName": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .post(fixture.url("/api/session/login"))
        .json(&json!({ "name": "山田 太郎" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Wrong type
    let resp = fixture
        .put(
            &format!("/api/admin/members/{}/presence", member_id),
            &fixture.admin_id,
        )
        .json(&json!({ "isPresent": "yes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Not JSON at all
    let resp = fixture
        .put("/api/meal", &member_id)
        .header("content-type", "application/json")
        .body("{drinkType")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_same_name_different_birthdays() {
    let fixture = TestFixture::new().await;
    let first = fixture.register("田中 翔", "翔", "0401").await;
    let second = fixture.register("田中 翔", "しょう", "1225").await;
    assert_ne!(first, second);

    for (birthday, expected_id, first_name) in
        [("0401", &first, "翔"), ("1225", &second, "しょう")]
    {
        let resp = fixture
            .client
            .post(fixture.url("/api/session/login"))
            .json(&json!({ "name": "田中 翔", "birthday": birthday }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["memberId"], expected_id.as_str());
        assert_eq!(body["data"]["firstName"], first_name);
    }

    let resp = fixture
        .client
        .post(fixture.url("/api/session/login"))
        .json(&json!({ "name": "田中 翔", "birthday": "0101" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_presence_is_idempotent() {
    let fixture = TestFixture::new().await;
    let member_id = fixture.register("山田 太郎", "太郎", "0205").await;
    let path = format!("/api/admin/members/{}/presence", member_id);

    for _ in 0..2 {
        let resp = fixture
            .put(&path, &fixture.admin_id)
            .json(&json!({ "isPresent": true }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["isPresent"], true);
    }

    let resp = fixture
        .get("/api/admin/members", &fixture.admin_id)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let row = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"] == member_id.as_str())
        .cloned()
        .unwrap();
    assert_eq!(row["isPresent"], true);
}
