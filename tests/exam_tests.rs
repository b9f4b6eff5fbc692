// tests/exam_tests.rs

use exam_coach::{
    config::Config,
    routes,
    state::AppState,
    store::{AttemptStore, RuleTable, rules::RuleMatch},
};
use std::{collections::HashMap, path::PathBuf};

const ATTEMPTS: &str = "\
student_id,question_id,topic,difficulty,question_type,student_answer,correct_answer,is_correct,score,time_spent
S12,Q1,Algebra,Easy,MCQ,3,4,0,0,30
S12,Q2,Algebra,Hard,MCQ,x+1,x-1,0,0,45
S12,Q3,Geometry,Easy,MCQ,90,90,1,1,20
S12,Q4,Geometry,Medium,MCQ,180,180,1,1,35
S7,Q1,Algebra,Easy,MCQ,4,4,1,1,15
S7,Q5,Calculus,Hard,MCQ,0,1,0,0,60
S7,Q6,Calculus,Medium,MCQ,e,e,1,1,50
S7,Q7,Geometry,Hard,MCQ,30,60,0,0,40
";

const RULES: &str = "\
antecedents,consequents,support,confidence,lift
\"frozenset({'Topic_Algebra'})\",\"frozenset({'Topic_Geometry'})\",0.2,0.7,1.3
";

struct TestApp {
    address: String,
    attempts_path: PathBuf,
}

async fn spawn_app() -> TestApp {
    let dir = std::env::temp_dir();
    let tag = uuid::Uuid::new_v4();
    let attempts_path = dir.join(format!("exam_attempts_{}.csv", tag));
    let rules_path = dir.join(format!("exam_rules_{}.csv", tag));
    std::fs::write(&attempts_path, ATTEMPTS).unwrap();
    std::fs::write(&rules_path, RULES).unwrap();

    let config = Config {
        attempts_path: attempts_path.clone(),
        rules_path: rules_path.clone(),
        jwt_secret: "exam_test_secret".to_string(),
        jwt_expiration: 600,
        session_ttl: 600,
        rule_match: RuleMatch::Exact,
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
        log_dir: dir.to_string_lossy().into_owned(),
    };

    let store = AttemptStore::load(&attempts_path).unwrap();
    let rules = RuleTable::load(&rules_path, config.rule_match).unwrap();
    let app = routes::create_router(AppState::new(store, rules, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        attempts_path,
    }
}

async fn login(client: &reqwest::Client, address: &str, student_id: &str) -> String {
    let resp: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "student_id": student_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    resp["token"].as_str().unwrap().to_string()
}

async fn start_exam(client: &reqwest::Client, address: &str, token: &str) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/exam/sessions", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_exam_focuses_on_weak_topics() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "S12").await;

    let exam = start_exam(&client, &app.address, &token).await;

    assert_eq!(exam["state"], "unstarted");
    assert_eq!(exam["focus"]["kind"], "weak_topics");
    assert_eq!(exam["focus"]["topics"], serde_json::json!(["Algebra"]));

    // Three Algebra rows exist in the log, so the sample is clamped to 3.
    let questions = exam["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for q in questions {
        assert_eq!(q["topic"], "Algebra");
        assert_eq!(q["options"].as_array().unwrap().len(), 4);
        assert_eq!(q["options"][0], "Option A");
        assert_eq!(q["selected"], "Option A");
        assert!(q.get("correct_answer").is_none());
    }
}

#[tokio::test]
async fn test_exam_falls_back_to_all_topics() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    // S7 missed Calculus and Geometry, but no rule mentions either.
    let token = login(&client, &app.address, "S7").await;

    let exam = start_exam(&client, &app.address, &token).await;

    assert_eq!(exam["focus"]["kind"], "general");
    let questions = exam["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);

    let mut rows: Vec<u64> = questions.iter().map(|q| q["row_id"].as_u64().unwrap()).collect();
    rows.sort();
    rows.dedup();
    assert_eq!(rows.len(), 5);
}

#[tokio::test]
async fn test_full_exam_flow_appends_attempts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "S12").await;

    let exam = start_exam(&client, &app.address, &token).await;
    let session_id = exam["session_id"].as_str().unwrap().to_string();
    let questions = exam["questions"].as_array().unwrap().clone();

    // Answer the first question correctly (the stored answer is the 4th option)
    // and leave the rest on the default first option.
    let first_row = questions[0]["row_id"].as_u64().unwrap();
    let first_correct = questions[0]["options"][3].as_str().unwrap().to_string();
    let mut answers = HashMap::new();
    answers.insert(first_row, first_correct.clone());

    let update = client
        .put(format!("{}/api/exam/sessions/{}/answers", app.address, session_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": answers }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status().as_u16(), 200);
    let updated: serde_json::Value = update.json().await.unwrap();
    assert_eq!(updated["state"], "in_progress");
    assert_eq!(updated["questions"][0]["selected"], first_correct);

    let submit = client
        .post(format!("{}/api/exam/sessions/{}/submit", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status().as_u16(), 200);
    let result: serde_json::Value = submit.json().await.unwrap();

    assert_eq!(result["persisted"], true);
    assert_eq!(result["total_questions"], 3);
    assert_eq!(result["correct_count"], 1);
    assert!((result["accuracy"].as_f64().unwrap() - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(result["results"].as_array().unwrap().len(), 3);

    // The log on disk gained one row per question.
    let reloaded = AttemptStore::load(&app.attempts_path).unwrap();
    assert_eq!(reloaded.len(), 8 + 3);
    let new_rows: Vec<_> = reloaded.attempts()[8..].to_vec();
    assert!(new_rows.iter().all(|a| a.student_id == "S12"));
    assert!(new_rows.iter().all(|a| a.topic == "Algebra"));
    assert!(new_rows.iter().all(|a| (15.0..=60.0).contains(&a.time_spent)));
    assert!(new_rows.iter().all(|a| a.score == u32::from(a.is_correct)));
    assert_eq!(new_rows.iter().filter(|a| a.is_correct).count(), 1);

    // Submitting twice is a conflict.
    let again = client
        .post(format!("{}/api/exam/sessions/{}/submit", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    // Nothing left to persist either.
    let persist = client
        .post(format!("{}/api/exam/sessions/{}/persist", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(persist.status().as_u16(), 409);

    // The dashboard sees the new attempts immediately.
    let dashboard: serde_json::Value = client
        .get(format!("{}/api/dashboard", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["summary"]["total_attempts"], 7);
}

#[tokio::test]
async fn test_submit_with_answers_in_body() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "S12").await;

    let exam = start_exam(&client, &app.address, &token).await;
    let session_id = exam["session_id"].as_str().unwrap();

    let answers: HashMap<u64, String> = exam["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| {
            (
                q["row_id"].as_u64().unwrap(),
                q["options"][3].as_str().unwrap().to_string(),
            )
        })
        .collect();

    let result: serde_json::Value = client
        .post(format!("{}/api/exam/sessions/{}/submit", app.address, session_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": answers }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["correct_count"], 3);
    assert_eq!(result["accuracy"], 100.0);
}

#[tokio::test]
async fn test_invalid_answers_are_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "S12").await;

    let exam = start_exam(&client, &app.address, &token).await;
    let session_id = exam["session_id"].as_str().unwrap();
    let row = exam["questions"][0]["row_id"].as_u64().unwrap();

    let bad_option = client
        .put(format!("{}/api/exam/sessions/{}/answers", app.address, session_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": { row.to_string(): "Option Z" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_option.status().as_u16(), 400);

    let bad_row = client
        .put(format!("{}/api/exam/sessions/{}/answers", app.address, session_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": { "999": "Option A" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_row.status().as_u16(), 400);

    let view: serde_json::Value = client
        .get(format!("{}/api/exam/sessions/{}", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["state"], "unstarted");
}

#[tokio::test]
async fn test_sessions_are_private_and_replaced() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token_a = login(&client, &app.address, "S12").await;
    let token_b = login(&client, &app.address, "S7").await;

    let first = start_exam(&client, &app.address, &token_a).await;
    let first_id = first["session_id"].as_str().unwrap();

    // Another student cannot see it.
    let foreign = client
        .get(format!("{}/api/exam/sessions/{}", app.address, first_id))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 404);

    // A new exam replaces the old one.
    let second = start_exam(&client, &app.address, &token_a).await;
    assert_ne!(second["session_id"], first["session_id"]);

    let old = client
        .get(format!("{}/api/exam/sessions/{}", app.address, first_id))
        .bearer_auth(&token_a)
        .send()
        .await
        .unwrap();
    assert_eq!(old.status().as_u16(), 404);
}

#[tokio::test]
async fn test_failed_write_keeps_score_and_can_be_retried() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "S12").await;

    let exam = start_exam(&client, &app.address, &token).await;
    let session_id = exam["session_id"].as_str().unwrap();

    // Pull the file out from under the store so the append fails.
    let parked = app.attempts_path.with_extension("parked");
    std::fs::rename(&app.attempts_path, &parked).unwrap();

    let result: serde_json::Value = client
        .post(format!("{}/api/exam/sessions/{}/submit", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["persisted"], false);
    assert_eq!(result["total_questions"], 3);

    let view: serde_json::Value = client
        .get(format!("{}/api/exam/sessions/{}", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["state"], "submitted");
    assert_eq!(view["persisted"], false);
    assert_eq!(view["outcome"]["total_questions"], 3);

    // Put the file back and retry.
    std::fs::rename(&parked, &app.attempts_path).unwrap();
    let retry = client
        .post(format!("{}/api/exam/sessions/{}/persist", app.address, session_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(retry.status().as_u16(), 200);
    let retried: serde_json::Value = retry.json().await.unwrap();
    assert_eq!(retried["persisted"], true);

    let reloaded = AttemptStore::load(&app.attempts_path).unwrap();
    assert_eq!(reloaded.len(), 8 + 3);
}
