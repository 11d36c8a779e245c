use groundhog::browser::SettleDelays;
use groundhog::{
    ActionFailure, ActionKind, ActionModel, Agent, AgentConfig, BrowserSession, ElementAction, LaunchOptions,
    ListedIds, PageDriver, TaskOutcome, distill,
};
use image::DynamicImage;

const FORM_PAGE: &str = "data:text/html,<html><body>\
    <h1>Checkout</h1>\
    <input id='name' placeholder='Full name'>\
    <select id='seat'><option value='e'>Economy</option><option value='b'>Business</option></select>\
    <button id='pay' onclick=\"document.title='paid'\">Pay now</button>\
    <script>var hidden = 'never listed';</script>\
    </body></html>";

fn launch() -> BrowserSession {
    BrowserSession::launch(LaunchOptions::new().headless(true).delays(SettleDelays::none()))
        .expect("Failed to launch browser")
}

/// Id the listing assigned to the first line starting with `<tag>`
fn listed_id(listing: &str, tag: &str) -> String {
    let marker = format!("<{}>", tag);
    let line = listing
        .lines()
        .find(|line| line.contains(&marker) && !line.starts_with("[-]"))
        .unwrap_or_else(|| panic!("no <{}> in listing:\n{}", tag, listing));
    line[1..line.find(']').unwrap()].to_string()
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_capture_distills_stamped_page() {
    let mut session = launch();
    session.navigate(FORM_PAGE).expect("Failed to navigate");

    let capture = session.capture().expect("Failed to capture");
    let listing = distill(&capture.html, 200).render();
    println!("{}", listing);

    assert!(listing.starts_with("[0] <option> Target element is not in this list"));
    assert!(listing.contains("[-] <h1> Checkout"));
    assert!(listing.contains("(ph='Full name')"));
    assert!(listing.contains("Pay now"));
    assert!(!listing.contains("never listed"));

    let ids = ListedIds::from_listing(&listing);
    assert!(ids.contains("0"));
    assert!(ids.len() >= 4);
}

#[test]
#[ignore]
fn test_stamping_is_stable_across_captures() {
    let mut session = launch();
    session.navigate(FORM_PAGE).expect("Failed to navigate");

    let first = distill(&session.capture().unwrap().html, 200).render();
    let second = distill(&session.capture().unwrap().html, 200).render();
    assert_eq!(first, second);
}

#[test]
#[ignore]
fn test_type_select_and_click() {
    let mut session = launch();
    session.navigate(FORM_PAGE).expect("Failed to navigate");
    let listing = distill(&session.capture().unwrap().html, 200).render();

    let input_id = listed_id(&listing, "input");
    session
        .execute(&ElementAction::new(ActionKind::Type, input_id).with_value("Ada Lovelace"))
        .expect("type failed");

    let select_id = listed_id(&listing, "select");
    session
        .execute(&ElementAction::new(ActionKind::Select, select_id.clone()).with_value("Business"))
        .expect("select failed");
    assert_eq!(
        session.execute(&ElementAction::new(ActionKind::Select, select_id).with_value("First")),
        Err(ActionFailure::OptionNotFound("First".to_string()))
    );

    let button_id = listed_id(&listing, "button");
    session
        .execute(&ElementAction::new(ActionKind::Click, button_id))
        .expect("click failed");

    let tab = session.tab();
    let state = tab
        .evaluate(
            "[document.getElementById('name').value, document.getElementById('seat').value, document.title].join('|')",
            false,
        )
        .unwrap();
    assert_eq!(state.value.unwrap().as_str().unwrap(), "Ada Lovelace|b|paid");
}

#[test]
#[ignore]
fn test_missing_element_is_reported() {
    let mut session = launch();
    session.navigate(FORM_PAGE).expect("Failed to navigate");
    let capture = session.capture().unwrap();

    // in range for the last stamping pass, but gone after a reload
    session.navigate(FORM_PAGE).expect("Failed to navigate");
    let outcome = session.execute(&ElementAction::new(ActionKind::Click, capture.max_id.to_string()));
    assert_eq!(outcome, Err(ActionFailure::ElementNotFound(capture.max_id.to_string())));
}

/// Clicks the pay button, then declares success
struct PayThenFinish;

impl ActionModel for PayThenFinish {
    fn predict(&self, _image: &DynamicImage, prompt: &str) -> groundhog::Result<String> {
        if prompt.contains("Pay now") && !prompt.contains("already paid") {
            let id = listed_id(prompt, "button");
            Ok(format!("```json\n{{\"action\": \"click\", \"element_id\": \"{}\"}}\n```", id))
        } else {
            Ok(r#"{"is_finished": true, "value": "paid"}"#.to_string())
        }
    }
}

#[test]
#[ignore]
fn test_agent_runs_against_chrome() {
    let mut session = launch();
    let page = "data:text/html,<html><body>\
        <button onclick=\"document.body.innerHTML='<h2>already paid</h2>'\">Pay now</button>\
        </body></html>";

    let outcome = Agent::new(&mut session, &PayThenFinish, AgentConfig::new().max_steps(4).without_settling())
        .run_task("Pay for the order", page)
        .expect("run failed");

    assert_eq!(
        outcome,
        TaskOutcome::Succeeded {
            result: Some("paid".to_string()),
            steps: 2
        }
    );
    assert!(session.current_url().unwrap().starts_with("data:text/html"));
}
