use calamine::{open_workbook, Reader, Xlsx};
use clap::Parser;
use serde_json::json;
use time::macros::date;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::app;
use crate::cli::args::{CliArgs, Command};
use crate::client::{ApiClient, ClientOptions};
use crate::config;
use crate::controller::{self, FilterSlot, Page, SampleList, SubmitOutcome, SAVED_TEXT};
use crate::form::sample::SampleForm;
use crate::form::{MINSUP, START_DATE};
use crate::output;
use crate::repl::{Command as ReplCommand, Session};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ClientOptions {
        base_url: server.uri(),
        ..ClientOptions::default()
    })
    .unwrap()
}

fn patterns_body() -> serde_json::Value {
    json!({
        "patterns": [
            {"antecedents": "(forks_q4)", "consequents": "(watches_q4)", "support": 0.21, "confidence": 0.8, "lift": 1.9},
            {"antecedents": "(forks_q1, stars_q1)", "consequents": "(pushes_q1)", "support": 0.12, "confidence": 0.6, "lift": 1.2},
            {"antecedents": "(language_Rust)", "consequents": "(forks_q4)", "support": 0.05, "confidence": 0.7, "lift": 3.4}
        ],
        "quartiles": [
            {"name": "forks", "Q1": 1, "Q2": 4, "Q3": 12},
            {"name": "pushes", "Q1": 10, "Q2": 80, "Q3": 250}
        ],
        "deciles": []
    })
}

fn first_column(table: &crate::table::ResultTable) -> Vec<String> {
    table
        .visible_rows()
        .map(|r| r.cells[0].text.clone())
        .collect()
}

#[tokio::test]
async fn pattern_search_filter_sort_and_export() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/find-patterns-submit"))
        .and(body_partial_json(json!({"ids": ["7", "3"], "antecedent": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(patterns_body()))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let args = CliArgs::parse_from(["patternscope", "patterns", "--ids", "7,3"]);
    let run = app::build_run_config(&args, config::ConfigFile::default()).unwrap();
    let Some(Command::Patterns(pattern_args)) = args.command else {
        panic!("expected patterns command");
    };
    let (mut ctl, ids) = app::build_pattern_controller(&run, &pattern_args).unwrap();

    let mut page = Page::default();
    for id in ids.iter() {
        page.toggle_selection(id, true);
    }
    assert_eq!(ctl.submit(&mut page, &client).await, SubmitOutcome::Completed);

    let view = &mut page.patterns;
    assert_eq!(view.title(), Some("Найдено 3 шаблона:"));
    assert_eq!(view.quartiles().header_texts(), vec!["name", "Q1", "Q2", "Q3"]);
    assert!(view.deciles().is_empty());

    assert_eq!(view.set_filter(FilterSlot::Antecedent, "~stars"), 2);
    assert_eq!(view.set_filter(FilterSlot::Antecedent, "forks&Q1"), 1);
    assert_eq!(view.set_filter(FilterSlot::Antecedent, ""), 3);
    assert_eq!(view.set_filter(FilterSlot::Consequent, "q4"), 2);

    let lift = view.column_index("lift").unwrap();
    assert!(view.sort(lift, false));
    assert_eq!(first_column(view.patterns()), vec!["(language_Rust)", "(forks_q4)"]);

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("patterns.csv");
    let format = output::export_table(view.patterns(), &file, None, true)
        .await
        .unwrap();
    assert_eq!(format, output::ExportFormat::Csv);
    let written = std::fs::read_to_string(&file).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Антецедент,Консеквент"));
    assert!(lines[1].starts_with("(language_Rust)"));
}

#[tokio::test]
async fn server_error_text_reaches_the_banner() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/find-patterns-submit"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"Error": "Недостаточно данных"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server);

    let mut ctl = controller::PatternController::new(
        crate::form::pattern::PatternForm::with_defaults(),
    );
    let mut page = Page::default();
    page.toggle_selection("1", true);

    let outcome = ctl.submit(&mut page, &client).await;
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected("Недостаточно данных".to_string())
    );
    assert!(page.banner.is_visible());
    assert_eq!(page.banner.text(), "Недостаточно данных");
    assert!(!page.patterns.is_results_visible());
    assert!(!page.loading.is_visible());
}

#[tokio::test]
async fn unreadable_error_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/load-data-submit"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let mut form = SampleForm::with_defaults(date!(2026 - 10 - 19));
    for label in ["pushes", "forks", "language"] {
        assert!(form.set_item_checked(label, true));
    }
    let mut ctl = controller::SampleController::new(form);
    let mut page = Page::default();

    let outcome = ctl.submit(&mut page, &client).await;
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(crate::client::FALLBACK_ERROR.to_string())
    );
    assert_eq!(page.banner.text(), "Ошибка сервера");
    assert!(page.notification.message().is_none());
}

#[tokio::test]
async fn sample_submission_sends_items_in_table_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/load-data-submit"))
        .and(body_partial_json(json!({
            "startDate": "2026-07-19",
            "endDate": "2026-10-19",
            "numRepos": 50,
            "isNewRepos": true,
            "items": {"pushes": "qua", "forks": "dec", "language": null}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let args = CliArgs::parse_from([
        "patternscope",
        "sample",
        "--item",
        "language",
        "--item",
        "forks=dec",
        "--item",
        "pushes",
        "--num-repos",
        "50",
        "--new-repos",
    ]);
    let run = app::build_run_config(&args, config::ConfigFile::default()).unwrap();
    let Some(Command::Sample(sample_args)) = args.command else {
        panic!("expected sample command");
    };
    let mut ctl = app::build_sample_controller(&run, &sample_args, date!(2026 - 10 - 19)).unwrap();
    assert_eq!(ctl.form.form.value(START_DATE), Some("2026-07-19"));

    let mut page = Page::default();
    assert_eq!(ctl.submit(&mut page, &client).await, SubmitOutcome::Completed);
    assert_eq!(page.notification.message(), Some(SAVED_TEXT));
    assert!(!page.banner.is_visible());
}

#[tokio::test]
async fn delete_removes_only_confirmed_samples() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete-sample/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/delete-sample/5"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"success": false, "error": "sample in use"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server);

    let mut page = Page::default();
    page.samples = SampleList::new(["4".to_string(), "5".to_string()]);

    assert!(controller::delete_sample(&mut page, &client, "4").await);
    assert!(!controller::delete_sample(&mut page, &client, "5").await);
    assert_eq!(page.samples.ids(), ["5".to_string()].as_slice());
    assert!(!page.banner.is_visible());
}

#[tokio::test]
async fn repl_session_drives_the_search_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/find-patterns-submit"))
        .and(body_partial_json(json!({"ids": ["2"], "minsup": 0.05})))
        .respond_with(ResponseTemplate::new(200).set_body_json(patterns_body()))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join(output::DEFAULT_EXPORT_FILE);

    let ctl = controller::PatternController::new(
        crate::form::pattern::PatternForm::with_defaults(),
    );
    let mut session = Session::new(Page::default(), ctl, &client)
        .with_export_path(export.display().to_string());

    let run = |line: &str| ReplCommand::parse(line).unwrap().unwrap();
    assert!(session.execute(run("submit")).await.is_err());
    assert_eq!(session.page.banner.text(), "Выберите минимум один набор данных");
    assert!(session.execute(run("set minsup 1.5")).await.is_err());

    session.execute(run("set minsup 0.05")).await.unwrap();
    session.execute(run("select 2")).await.unwrap();
    let table = session.execute(run("submit")).await.unwrap();
    assert!(table.contains("Найдено 3 шаблона:"));

    let shown = session.execute(run("filter consequent q4")).await.unwrap();
    assert_eq!(shown, "2 of 3 rows shown");
    session.execute(run("sort support asc")).await.unwrap();
    assert_eq!(
        first_column(session.page.patterns.patterns()),
        vec!["(language_Rust)", "(forks_q4)"]
    );

    let toggled = session.execute(run("quantiles")).await.unwrap();
    assert!(toggled.starts_with("▼"));
    assert!(toggled.contains("pushes"));

    let wrote = session.execute(run("export")).await.unwrap();
    assert!(wrote.contains("spreadsheet"));
    let mut workbook: Xlsx<_> = open_workbook(&export).unwrap();
    let sheet = workbook.worksheet_range("Sheet1").unwrap();
    assert_eq!(sheet.get_size(), (4, 5));
    let antecedents: Vec<String> = sheet.rows().skip(1).map(|r| r[0].to_string()).collect();
    assert!(antecedents.contains(&"(forks_q1, stars_q1)".to_string()));
}

#[test]
fn config_file_overrides_field_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(
        &path,
        "server: http://backend.test:9000\nfields:\n  minsup:\n    value: 0.3\n    max: 0.5\nsamples: ['1', '2', '1']\n",
    )
    .unwrap();

    let cfg = config::load_config(&path, false).unwrap();
    let args = CliArgs::parse_from(["patternscope", "patterns"]);
    let run = app::build_run_config(&args, cfg).unwrap();
    assert_eq!(run.server_url, "http://backend.test:9000");
    assert_eq!(run.samples, vec!["1", "2"]);

    let Some(Command::Patterns(pattern_args)) = args.command else {
        panic!("expected patterns command");
    };
    let (ctl, ids) = app::build_pattern_controller(&run, &pattern_args).unwrap();
    assert!(ids.is_empty());
    assert_eq!(ctl.form.form.value(MINSUP), Some("0.3"));
    assert_eq!(ctl.form.form.number(MINSUP).map(|f| f.max), Some(0.5));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yml");
    assert!(config::load_config(&path, false).is_err());
    assert_eq!(
        config::load_config(&path, true).unwrap(),
        config::ConfigFile::default()
    );
}
