use cusched::config::toml_config::TomlConfig;
use cusched::core::planner::EXTRACTION_FAILED;
use cusched::{
    CatalogPipeline, LlmClient, LocalStorage, PlannerInput, PlannerOutcome, SchedulePlanner,
    TimetableClient,
};
use httpmock::prelude::*;
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

const COMP_RESULTS: &str = r##"<html><body><table>
<tr bgcolor="#C0C0C0"><td></td><td>Open</td><td>31245</td><td>COMP 1405</td><td>A</td>
<td>Intro to Computer Science I</td><td>0.5</td><td>Lecture</td><td></td><td></td><td>Jane Smith</td></tr>
<tr bgcolor="#C0C0C0"><td></td><td>Meeting Date: Sep 04, 2024 to Dec 06, 2024 Days: Tue Thu Time: 10:05 - 11:25</td></tr>
<tr bgcolor="#C0C0C0"><td></td><td>Also Register in: COMP 1405 A1</td></tr>
<tr bgcolor="#C0C0C0"><td></td><td>Section Information: in person</td></tr>
<tr bgcolor="#DCDCDC"><td></td><td>Full</td><td>31301</td><td>COMP 1406</td><td>B</td>
<td>Intro to Computer Science II</td><td>0.5</td><td>Lecture</td><td></td><td></td><td>Ali Khan</td></tr>
<tr bgcolor="#DCDCDC"><td></td><td>Meeting Date: Sep 04, 2024 to Dec 06, 2024 Days: Mon Wed Time: 13:05 - 14:25</td></tr>
</table></body></html>"##;

fn chat_reply(content: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
    })
}

fn extraction_reply() -> serde_json::Value {
    chat_reply(serde_json::json!({
        "status": "success",
        "special_request": "avoid Fridays",
        "mandatory": [{"course_code": "COMP1405"}],
        "electives": [{"course_code": "MATH1007"}, {"course_code": "HIST9999"}]
    }))
}

fn synthesis_reply() -> serde_json::Value {
    chat_reply(serde_json::json!({
        "status": "success",
        "schedules": [{
            "schedule_id": 1,
            "courses": [{
                "status": "Open",
                "crn": "31245",
                "course_code": "COMP 1405",
                "section": "A",
                "course_title": "Intro to Computer Science I",
                "credits": 0.5,
                "schedule_type": "Lecture",
                "instructor": "Jane Smith",
                "day": "Tue Thu",
                "start_time": "10:05",
                "end_time": "11:25",
                "also_register_in": "COMP 1405 A1"
            }]
        }]
    }))
}

fn config_for(server: &MockServer, output: &TempDir) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.timetable.endpoint = server.url("/prod/bwysched.p_course_search");
    config.timetable.timeout_seconds = 5;
    config.llm.base_url = server.url("/openai/v1");
    config.courses.allowed_codes = vec![
        "COMP1405".to_string(),
        "COMP1406".to_string(),
        "MATH1007".to_string(),
    ];
    config.output.path = output.path().to_str().unwrap().to_string();
    config.output.persist = true;
    config
}

fn planner_for(config: TomlConfig) -> SchedulePlanner<CatalogPipeline<LocalStorage>> {
    let llm = Arc::new(LlmClient::from_config(&config.llm, "gsk_test".to_string()).unwrap());
    let timetable = Arc::new(TimetableClient::from_config(&config.timetable).unwrap());
    let allowed = config.courses.allowed_codes.clone();
    let limits = config.generation_limits();
    let storage = LocalStorage::new(config.output_path());
    let pipeline = CatalogPipeline::new(timetable, storage, config);

    SchedulePlanner::new(pipeline, llm.clone(), llm.clone(), allowed)
        .with_transcriber(llm)
        .with_limits(limits)
}

fn read_entry(archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_with_failing_department() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    let extraction_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .body_contains("course code extraction assistant");
        then.status(200).json_body(extraction_reply());
    });
    let synthesis_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .body_contains("scheduling assistant")
            .body_contains("MANDATORY COURSES: COMP1405")
            .body_contains("ELECTIVE COURSES: MATH1007")
            .body_contains("SPECIAL REQUESTS: avoid Fridays")
            .body_contains("## COMP 1405 (Section A)");
        then.status(200).json_body(synthesis_reply());
    });
    let comp_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/prod/bwysched.p_course_search")
            .body_contains("sel_subj=COMP");
        then.status(200).body(COMP_RESULTS);
    });
    let math_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/prod/bwysched.p_course_search")
            .body_contains("sel_subj=MATH");
        then.status(503).body("Service Unavailable");
    });

    let planner = planner_for(config_for(&server, &output));
    let outcome = planner
        .plan(PlannerInput::text(
            "I need COMP 1405, math 1007 is optional. Please avoid Fridays.",
        ))
        .await;

    extraction_mock.assert();
    synthesis_mock.assert();
    comp_mock.assert();
    math_mock.assert();

    let PlannerOutcome::Schedules(response) = outcome else {
        panic!("expected a schedule response");
    };
    assert_eq!(response.status, "success");
    assert_eq!(response.special_requests.as_deref(), Some("avoid Fridays"));
    assert_eq!(response.requested_courses.mandatory.len(), 1);
    assert_eq!(response.requested_courses.electives.len(), 1);
    assert_eq!(response.schedules[0].courses[0].crn, "31245");

    let zip_data = std::fs::read(output.path().join("catalog_run.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();

    let catalog = read_entry(&mut archive, "catalog.md");
    assert!(catalog.starts_with("# Course List\n"));
    assert_eq!(catalog.matches("## ").count(), 1);
    assert!(catalog.contains("- **Days**: Tue Thu\n"));
    assert!(catalog.contains("- **Time**: 10:05 - 11:25\n"));
    assert!(catalog.contains("- **Also Register in**: COMP 1405 A1\n"));
    assert!(!catalog.contains("COMP 1406"));

    let sections: serde_json::Value =
        serde_json::from_str(&read_entry(&mut archive, "sections.json")).unwrap();
    assert_eq!(sections.as_array().unwrap().len(), 1);
    assert_eq!(sections[0]["course_code"], "COMP 1405");

    let manifest: serde_json::Value =
        serde_json::from_str(&read_entry(&mut archive, "manifest.json")).unwrap();
    assert_eq!(manifest["departments"], serde_json::json!(["COMP", "MATH"]));
    assert_eq!(manifest["fetched_sections"], 2);
    assert_eq!(manifest["matched_sections"], 1);
}

#[tokio::test]
async fn test_extraction_failure_skips_timetable() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/openai/v1/chat/completions");
        then.status(500).body("internal error");
    });
    let timetable_mock = server.mock(|when, then| {
        when.method(POST).path("/prod/bwysched.p_course_search");
        then.status(200).body(COMP_RESULTS);
    });

    let planner = planner_for(config_for(&server, &output));
    let outcome = planner.plan(PlannerInput::text("COMP 1405")).await;

    let PlannerOutcome::Failure(failure) = outcome else {
        panic!("expected a failure");
    };
    assert_eq!(failure.error, EXTRACTION_FAILED);
    assert!(failure.details.contains("500"));
    assert_eq!(timetable_mock.hits(), 0);
    assert!(!output.path().join("catalog_run.zip").exists());
}

#[tokio::test]
async fn test_synthesis_failure_echoes_request() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .body_contains("course code extraction assistant");
        then.status(200).json_body(extraction_reply());
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .body_contains("scheduling assistant");
        then.status(200)
            .json_body(chat_reply(serde_json::Value::String("oops".to_string())));
    });
    server.mock(|when, then| {
        when.method(POST).path("/prod/bwysched.p_course_search");
        then.status(200).body(COMP_RESULTS);
    });

    let mut config = config_for(&server, &output);
    config.output.persist = false;
    let planner = planner_for(config);
    let outcome = planner.plan(PlannerInput::text("COMP 1405, maybe MATH 1007")).await;

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["schedules"], serde_json::json!([]));
    assert_eq!(
        json["requested_courses"]["mandatory"],
        serde_json::json!([{"course_code": "COMP1405"}])
    );
    assert_eq!(
        json["requested_courses"]["electives"],
        serde_json::json!([{"course_code": "MATH1007"}])
    );
    assert_eq!(json["special_requests"], "avoid Fridays");
    assert!(!output.path().join("catalog_run.zip").exists());
}

#[tokio::test]
async fn test_oversized_audio_is_reported() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/openai/v1/audio/transcriptions");
        then.status(413).body("Request Entity Too Large");
    });
    let chat_mock = server.mock(|when, then| {
        when.method(POST).path("/openai/v1/chat/completions");
        then.status(200).json_body(extraction_reply());
    });

    let planner = planner_for(config_for(&server, &output));
    let audio = cusched::domain::model::AudioInput {
        file_name: "request.wav".to_string(),
        bytes: vec![0; 64],
    };
    let outcome = planner.plan(PlannerInput::audio(audio)).await;

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        serde_json::json!({
            "error": "Error extracting course codes",
            "details": "Audio file is too large. Please provide a smaller file or use raw text input."
        })
    );
    assert_eq!(chat_mock.hits(), 0);
}
