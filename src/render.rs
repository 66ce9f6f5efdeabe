use tracing::{debug, warn};

use crate::classify::{self, Band};
use crate::dom::{Element, Node};
use crate::models::PredictionResult;
use crate::page::{self, Document, DomError, ScrollBehavior};

pub const COUNSELOR_MESSAGE: &str = "High risk detected. Recommend consulting a counselor.";
pub const PROCTOR_MEETING_MESSAGE: &str =
    "Due to high stress or depression, a meeting with your proctor is recommended.";
pub const PROCTOR_REVIEW_MESSAGE: &str =
    "Student overwhelmed with workload or poor sleep. Review study schedule.";
pub const DISTRESS_WARNING: &str = "Your results indicate high levels of distress. \
     Please seek immediate support from available resources.";

pub const CRISIS_CONTACTS: [&str; 3] = [
    "Campus Counseling: 1800-123-4567",
    "24/7 Crisis Helpline: 1800-273-8255",
    "Student Health Center: SJT-VIT, Room-801",
];

const DISMISS_SCRIPT: &str = "this.closest('.emergency-alert').style.display='none'";

/// Advisory messages derived from the backend flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisories {
    pub counselor: Option<&'static str>,
    pub proctor: Option<&'static str>,
}

pub fn advisories(result: &PredictionResult) -> Advisories {
    let emergency = classify::is_emergency(result.stress_score, result.depression_score);

    let counselor = result.alert_counselor.then_some(COUNSELOR_MESSAGE);
    let proctor = result.alert_proctor.then_some(if emergency {
        PROCTOR_MEETING_MESSAGE
    } else {
        PROCTOR_REVIEW_MESSAGE
    });

    Advisories { counselor, proctor }
}

fn advisory(class: &str, title: &str, message: &str) -> Node {
    Element::new("div")
        .with_class(class)
        .child(Element::new("span").with_class("alert-title").text(title))
        .child(Element::new("p").text(message))
        .into()
}

fn score_line(text: String) -> Node {
    Element::new("p").with_class("score-display").text(text).into()
}

/// Content of the result panel for one prediction. Pure: the same input always
/// yields the same tree.
pub fn panel_view(result: &PredictionResult) -> Element {
    let emergency = classify::is_emergency(result.stress_score, result.depression_score);
    let advisories = advisories(result);
    let stress_band = classify::band(result.stress_score);

    let status = Element::new("div").with_class("stress-info").child(
        Element::new("div")
            .with_class(&format!("stress-level {stress_band}"))
            .child(Element::new("h3").text("Mental Health Status"))
            .child(
                Element::new("div")
                    .with_class("scores-container")
                    .child(score_line(format!("Stress Level: {}", result.stress_level)))
                    .child(score_line(format!("Stress Score: {:.2}", result.stress_score)))
                    .child(score_line(format!(
                        "Depression Level: {}",
                        result.depression_level
                    )))
                    .child(score_line(format!(
                        "Depression Score: {:.2}",
                        result.depression_score
                    ))),
            ),
    );

    let mut view = Element::new("div")
        .with_class("analysis-result")
        .child(Element::new("h2").text("Analysis Results"))
        .child(status);

    if let Some(message) = advisories.counselor {
        view = view.child(advisory("alert counselor-alert", "Counselor Alert", message));
    }
    if let Some(message) = advisories.proctor {
        view = view.child(advisory("alert proctor-alert", "Proctor Notification", message));
    }
    if emergency {
        view = view.child(
            Element::new("div")
                .with_class("emergency-warning")
                .child(Element::new("p").with_class("warning-text").text(DISTRESS_WARNING)),
        );
    }

    let items = result
        .recommendations
        .iter()
        .flatten()
        .map(|rec| Node::from(Element::new("li").text(rec.as_str())));

    view.child(
        Element::new("div")
            .with_class("recommendations")
            .child(Element::new("h3").text("Recommendations"))
            .child(Element::new("ul").children(items)),
    )
}

pub fn emergency_alert_view() -> Element {
    let contacts = CRISIS_CONTACTS
        .iter()
        .map(|contact| Node::from(Element::new("li").text(*contact)));

    Element::new("div").child(
        Element::new("div")
            .with_class("emergency-content")
            .child(Element::new("h2").text("EMERGENCY ALERT"))
            .child(Element::new("p").text("Your mental health indicators show critical levels."))
            .child(
                Element::new("div")
                    .with_class("emergency-contacts")
                    .child(Element::new("h3").text("Immediate Support Available:"))
                    .child(Element::new("ul").children(contacts)),
            )
            .child(
                Element::new("button")
                    .with_class("close-alert")
                    .with_attr("type", "button")
                    .with_attr("onclick", DISMISS_SCRIPT)
                    .text("Acknowledge"),
            ),
    )
}

fn update_gauge(document: &mut Document, id: &str, score: f64) -> Result<Band, DomError> {
    let band = classify::band(score);
    let gauge = document.element_mut(id)?;
    gauge.set_style("width", classify::gauge_width(score));
    gauge.set_class_name(&format!("progress {band}"));
    Ok(band)
}

/// Apply a prediction to the page: reveal and rebuild the result panel,
/// update the overview gauges and fields, raise the emergency alert when
/// warranted, then scroll the panel into view.
pub fn render(document: &mut Document, result: &PredictionResult) -> Result<(), DomError> {
    let emergency = classify::is_emergency(result.stress_score, result.depression_score);

    let stress_band = update_gauge(document, page::STRESS_GAUGE, result.stress_score)?;
    let depression_band = update_gauge(document, page::DEPRESSION_GAUGE, result.depression_score)?;

    document
        .element_mut(page::STRESS_LEVEL)?
        .set_text(result.stress_level.as_str());
    document
        .element_mut(page::DEPRESSION_LEVEL)?
        .set_text(result.depression_level.as_str());
    document
        .element_mut(page::STRESS_SCORE)?
        .set_text(format!("{:.2}", result.stress_score));
    document
        .element_mut(page::DEPRESSION_SCORE)?
        .set_text(format!("{:.2}", result.depression_score));

    let panel = document.element_mut(page::RESULT)?;
    panel.hidden = false;
    panel.children = vec![Node::Element(panel_view(result))];

    if emergency {
        let handle = document.show_emergency_alert(emergency_alert_view());
        warn!(
            alert = %handle.id(),
            stress = result.stress_score,
            depression = result.depression_score,
            "emergency threshold exceeded"
        );
    }

    document.scroll_into_view(page::RESULT, ScrollBehavior::Smooth)?;
    debug!(%stress_band, %depression_band, emergency, "result rendered");
    Ok(())
}
