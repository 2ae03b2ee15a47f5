//! Intake wizard: the linear welcome → name → request → files → thanks flow.
//!
//! A session's step is persisted so a reload resumes where the user left
//! off; the form itself only lives in memory. The name step and the files
//! step each write a project record through the submission gateway.

pub mod manager;
pub mod model;
pub mod render;
pub mod routes;
pub mod session;
pub mod step;
pub mod store;

pub use manager::{GatewayOutcome, WizardAction, WizardManager, WizardView};
pub use model::{OnboardingForm, ProjectRecord};
pub use render::{Screen, render, render_raw};
pub use routes::{WizardRouteState, wizard_routes};
pub use session::WizardSession;
pub use step::Step;
pub use store::StepStore;
