use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::dom::{Element, Node};
use crate::form;

pub const FORM: &str = "stressForm";
pub const RESULT: &str = "result";
pub const STRESS_GAUGE: &str = "stress-gauge";
pub const DEPRESSION_GAUGE: &str = "depression-gauge";
pub const STRESS_LEVEL: &str = "stress-level";
pub const DEPRESSION_LEVEL: &str = "depression-level";
pub const STRESS_SCORE: &str = "stress-score";
pub const DEPRESSION_SCORE: &str = "depression-score";

pub const EMERGENCY_ALERT_CLASS: &str = "emergency-alert";

pub const REQUIRED_IDS: [&str; 15] = [
    FORM,
    form::STUDENT_ID,
    form::TEXT,
    form::IMAGE,
    form::STUDY_TIME,
    form::SOCIAL_MEDIA,
    form::SLEEP_HOURS,
    form::DEADLINES,
    RESULT,
    STRESS_GAUGE,
    DEPRESSION_GAUGE,
    STRESS_LEVEL,
    DEPRESSION_LEVEL,
    STRESS_SCORE,
    DEPRESSION_SCORE,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("required element `#{0}` not found")]
    ElementNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertHandle(Uuid);

impl AlertHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRequest {
    pub target: String,
    pub behavior: ScrollBehavior,
}

/// The live page: the body tree plus the UI state that outlives one render.
#[derive(Debug, Clone)]
pub struct Document {
    body: Element,
    active_alert: Option<AlertHandle>,
    scroll: Option<ScrollRequest>,
}

impl Document {
    /// Take ownership of a body tree, checking every element the controller
    /// and renderer depend on.
    pub fn mount(body: Element) -> Result<Self, DomError> {
        for id in REQUIRED_IDS {
            if body.find(id).is_none() {
                return Err(DomError::ElementNotFound(id.to_string()));
            }
        }
        debug!(elements = REQUIRED_IDS.len(), "page mounted");

        Ok(Self {
            body,
            active_alert: None,
            scroll: None,
        })
    }

    #[cfg(test)]
    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn element(&self, id: &str) -> Result<&Element, DomError> {
        self.body
            .find(id)
            .ok_or_else(|| DomError::ElementNotFound(id.to_string()))
    }

    pub fn element_mut(&mut self, id: &str) -> Result<&mut Element, DomError> {
        self.body
            .find_mut(id)
            .ok_or_else(|| DomError::ElementNotFound(id.to_string()))
    }

    pub fn scroll_into_view(&mut self, id: &str, behavior: ScrollBehavior) -> Result<(), DomError> {
        self.element(id)?;
        self.scroll = Some(ScrollRequest {
            target: id.to_string(),
            behavior,
        });
        Ok(())
    }

    pub fn last_scroll(&self) -> Option<&ScrollRequest> {
        self.scroll.as_ref()
    }

    /// Insert an emergency alert as the first child of the body. Any alert
    /// already in the document is removed first, so at most one exists.
    pub fn show_emergency_alert(&mut self, alert: Element) -> AlertHandle {
        let replaced = self.remove_emergency_alerts();
        if replaced > 0 {
            debug!(replaced, "replacing emergency alert");
        }

        let handle = AlertHandle(Uuid::new_v4());
        let alert = alert
            .with_class(EMERGENCY_ALERT_CLASS)
            .with_attr("data-alert-id", handle.id().to_string());
        self.body.children.insert(0, Node::Element(alert));
        self.active_alert = Some(handle);
        handle
    }

    /// Hide the active alert. The element stays in the document.
    pub fn dismiss_emergency_alert(&mut self) -> bool {
        let Some(handle) = self.active_alert.take() else {
            return false;
        };

        let id = handle.id().to_string();
        for node in self.body.children.iter_mut() {
            if let Node::Element(element) = node {
                if element.attrs.get("data-alert-id") == Some(&id) {
                    element.hidden = true;
                }
            }
        }
        true
    }

    pub fn active_alert(&self) -> Option<AlertHandle> {
        self.active_alert
    }

    pub fn emergency_alerts(&self) -> Vec<&Element> {
        self.body.find_by_class(EMERGENCY_ALERT_CLASS)
    }

    fn remove_emergency_alerts(&mut self) -> usize {
        let before = self.body.children.len();
        self.body.children.retain(|node| {
            !matches!(node, Node::Element(element) if element.has_class(EMERGENCY_ALERT_CLASS))
        });
        before - self.body.children.len()
    }

    pub fn to_html(&self) -> String {
        let scroll = self
            .last_scroll()
            .map(|request| {
                let behavior = match request.behavior {
                    ScrollBehavior::Smooth => "smooth",
                };
                format!(
                    "<script>document.getElementById('{}').scrollIntoView({{ behavior: '{}' }});</script>\n",
                    request.target, behavior
                )
            })
            .unwrap_or_default();

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Student Stress &amp; Depression Check</title>\n</head>\n{}\n{}</html>\n",
            self.body.to_html(),
            scroll
        )
    }
}

fn input(id: &str, kind: &str, label: &str) -> Node {
    Element::new("label")
        .with_attr("for", id)
        .text(label)
        .child(
            Element::new("input")
                .with_id(id)
                .with_attr("name", id)
                .with_attr("type", kind),
        )
        .into()
}

fn gauge(id: &str, title: &str) -> Node {
    Element::new("div")
        .with_class("gauge")
        .child(Element::new("span").with_class("gauge-title").text(title))
        .child(
            Element::new("div")
                .with_class("progress-track")
                .child(Element::new("div").with_id(id).with_class("progress normal")),
        )
        .into()
}

fn field(label: &str, id: &str) -> Node {
    Element::new("p")
        .text(label)
        .child(Element::new("span").with_id(id))
        .into()
}

/// The survey page. Gauges and the plain score fields sit outside the result
/// panel so rebuilding the panel leaves them in place.
pub fn skeleton() -> Element {
    let survey_form = Element::new("form")
        .with_id(FORM)
        .with_attr("enctype", "multipart/form-data")
        .child(input(form::STUDENT_ID, "text", "Student ID"))
        .child(
            Element::new("label")
                .with_attr("for", form::TEXT)
                .text("How are you feeling?")
                .child(
                    Element::new("textarea")
                        .with_id(form::TEXT)
                        .with_attr("name", form::TEXT),
                ),
        )
        .child(input(form::IMAGE, "file", "Photo"))
        .child(input(form::STUDY_TIME, "number", "Study time (hours)"))
        .child(input(form::SOCIAL_MEDIA, "number", "Social media (minutes)"))
        .child(input(form::SLEEP_HOURS, "number", "Sleep (hours)"))
        .child(input(form::DEADLINES, "number", "Upcoming deadlines"))
        .child(
            Element::new("button")
                .with_attr("type", "submit")
                .text("Analyze"),
        );

    let overview = Element::new("section")
        .with_class("overview")
        .child(gauge(STRESS_GAUGE, "Stress"))
        .child(gauge(DEPRESSION_GAUGE, "Depression"))
        .child(field("Stress level: ", STRESS_LEVEL))
        .child(field("Stress score: ", STRESS_SCORE))
        .child(field("Depression level: ", DEPRESSION_LEVEL))
        .child(field("Depression score: ", DEPRESSION_SCORE));

    Element::new("body")
        .child(survey_form)
        .child(overview)
        .child(Element::new("div").with_id(RESULT).with_class("result").hidden())
}
