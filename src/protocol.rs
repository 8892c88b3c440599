//! Form payloads accepted by the HTTP routes, plus the health DTO.
//! Missing form fields deserialize as empty strings so handlers can report
//! them as form errors instead of rejecting the request.

use serde::{Deserialize, Serialize};

use crate::domain::QuestionFilter;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuestionForm {
    pub company: String,
    pub topic: String,
    pub difficulty: String,
}

impl QuestionForm {
    pub fn to_filter(&self) -> QuestionFilter {
        QuestionFilter {
            company: self.company.trim().to_string(),
            topic: self.topic.trim().to_string(),
            difficulty: self.difficulty.trim().to_string(),
        }
    }
}

/// Solution submission. `question` is the formatted question text the
/// page was showing when the code was written.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SolutionForm {
    pub question: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
