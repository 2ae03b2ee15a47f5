//! Screen projection: what each step shows, as data for the page.

use serde::Serialize;

use super::model::OnboardingForm;
use super::step::Step;

/// Kind of input a screen carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Textarea,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Input {
    pub kind: InputKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    /// Current value (empty for file inputs).
    pub value: String,
}

/// A button and the wizard action it sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: &'static str,
    pub action: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: &'static str,
    pub href: String,
}

/// Everything needed to draw one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screen {
    pub step: Step,
    pub heading: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Input>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<Button>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

/// Project `step` and `form` onto a screen.
pub fn render(step: Step, form: &OnboardingForm, home_url: &str) -> Screen {
    match step {
        Step::Welcome => welcome(),
        Step::Name => Screen {
            step,
            heading: "Who are you?",
            description: "We want to know who you are so we can get in touch with you. \
                And will be stored in our database.",
            input: Some(Input {
                kind: InputKind::Text,
                placeholder: Some("John Doe"),
                value: form.name.clone(),
            }),
            files: Vec::new(),
            primary: Some(Button {
                label: "Next",
                action: "submit_name",
            }),
            link: None,
        },
        Step::Request => Screen {
            step,
            heading: "What is your thinking?",
            description: "We want to know what you want, what you're thinking, \
                and what you're not thinking.",
            input: Some(Input {
                kind: InputKind::Textarea,
                placeholder: Some(
                    "I want a website that does... The vibe I want... I want it to look like...",
                ),
                value: form.request.clone(),
            }),
            files: Vec::new(),
            // The button only shows up once something has been typed.
            primary: (!form.request.is_empty()).then_some(Button {
                label: "Next",
                action: "submit_request",
            }),
            link: None,
        },
        Step::Files => Screen {
            step,
            heading: "Upload your files.",
            description: "You can upload any files you want to share with us. From branding \
                assets, to reference images. We'll be able to see them and download them.",
            input: Some(Input {
                kind: InputKind::File,
                placeholder: None,
                value: String::new(),
            }),
            files: form.files.clone(),
            primary: Some(Button {
                label: "Next",
                action: "finish",
            }),
            link: None,
        },
        Step::Thanks => Screen {
            step,
            heading: "Thank you, we should have everything we need!",
            description: "Catch you in a few days, we'll be in touch with you soon. \
                If you have any questions, feel free to reach out to us!",
            input: None,
            files: Vec::new(),
            primary: None,
            link: Some(Link {
                label: "Go back home",
                href: home_url.to_string(),
            }),
        },
    }
}

/// Render from a raw step identifier; unknown identifiers get the welcome screen.
pub fn render_raw(raw: &str, form: &OnboardingForm, home_url: &str) -> Screen {
    render(Step::parse_lenient(raw), form, home_url)
}

fn welcome() -> Screen {
    Screen {
        step: Step::Welcome,
        heading: "Thanks for using our service! Let's get things out of the way.",
        description: "You'll be prompted some questions about what you exactly want. \
            From your thinking of the project, to the files you want to share with us.",
        input: None,
        files: Vec::new(),
        primary: Some(Button {
            label: "Get Started",
            action: "begin",
        }),
        link: None,
    }
}
