//! Question flow: picks the question that follows the current one.
//!
//! Routing order for `next_question_by_keywords`:
//! 1. the first route keyword (document order) found in the answer,
//! 2. the question's `defaultNextQuestionId`,
//! 3. the next question in catalog order.
//!
//! A target id that does not exist in the list falls through to the next rule.

use tracing::debug;

use crate::interview::question_bank::Question;

pub fn first_question(questions: &[Question]) -> Option<&Question> {
    questions.first()
}

fn find_by_id(questions: &[Question], id: i64) -> Option<&Question> {
    questions.iter().find(|q| q.id() == Some(id))
}

/// The question after `current_id` in catalog order; `None` if `current_id`
/// is unknown or already the last question.
pub fn next_question(questions: &[Question], current_id: i64) -> Option<&Question> {
    let index = questions.iter().position(|q| q.id() == Some(current_id))?;
    questions.get(index + 1)
}

pub fn next_question_by_keywords<'a>(
    questions: &'a [Question],
    current_id: i64,
    answer: &str,
) -> Option<&'a Question> {
    let current = find_by_id(questions, current_id)?;

    if !answer.is_empty() {
        let answer_lower = answer.to_lowercase();
        let routed = current
            .route_keywords()
            .into_iter()
            .find(|(keyword, _)| answer_lower.contains(&keyword.to_lowercase()));

        if let Some((keyword, target_id)) = routed {
            if let Some(next) = find_by_id(questions, target_id) {
                debug!(
                    "Keyword routing: \"{keyword}\" -> question {target_id} ({})",
                    next.prompt().unwrap_or("untitled")
                );
                return Some(next);
            }
        }
    }

    if let Some(default_id) = current.default_next_question_id() {
        if let Some(next) = find_by_id(questions, default_id) {
            debug!("Default routing: question {current_id} -> question {default_id}");
            return Some(next);
        }
    }

    next_question(questions, current_id)
}

/// Opening line spoken at the start of a session.
pub fn greeting_message(name: Option<&str>, domain: Option<&str>, level: Option<&str>) -> String {
    fn present(part: Option<&str>) -> Option<&str> {
        part.map(str::trim).filter(|p| !p.is_empty())
    }

    let name = present(name).map(|n| format!(" {n}")).unwrap_or_default();
    let domain = present(domain)
        .map(|d| format!(" for the {d} position"))
        .unwrap_or_default();
    let level = present(level)
        .map(|l| format!(" at {l} level"))
        .unwrap_or_default();

    format!(
        "Hello{name}! Welcome to your technical interview practice session{domain}{level}. \
         I'll be asking you some questions today. Let's begin!"
    )
}
