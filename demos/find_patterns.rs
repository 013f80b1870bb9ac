use patternscope::client::{ApiClient, ClientOptions};
use patternscope::controller::{FilterSlot, Page, PatternController, SubmitOutcome};
use patternscope::form::pattern::PatternForm;
use patternscope::form::MINSUP;
use patternscope::output;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(&ClientOptions {
        base_url: "http://127.0.0.1:8000/".to_string(),
        timeout_seconds: Some(30),
        ..ClientOptions::default()
    })?;

    let mut form = PatternForm::with_defaults();
    form.form.set_value(MINSUP, "0.05");
    let mut ctl = PatternController::new(form);

    let mut page = Page::default();
    page.toggle_selection("1", true);
    page.toggle_selection("2", true);

    match ctl.submit(&mut page, &client).await {
        SubmitOutcome::Completed => {}
        SubmitOutcome::Invalid | SubmitOutcome::Rejected(_) => {
            return Err(page.banner.text().to_string().into());
        }
    }

    page.patterns.set_filter(FilterSlot::Consequent, "~language");
    if let Some(col) = page.patterns.column_index("lift") {
        page.patterns.sort(col, false);
    }

    if let Some(title) = page.patterns.title() {
        println!("{title}");
    }
    print!("{}", output::render_text(page.patterns.patterns(), true));

    Ok(())
}
