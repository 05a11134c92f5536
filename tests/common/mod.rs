//! Payload fixtures shared by the integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

pub fn account() -> Value {
    json!({"id": 1, "name": "Acme", "nick": "acme"})
}

pub fn author() -> Value {
    json!({"id": 7, "email": "hr@acme.example", "name": "Olga"})
}

/// Envelope metadata for the 2.0 generation
pub fn meta_v2(event_type: &str, action: &str) -> Value {
    json!({
        "account": account(),
        "author": author(),
        "event_type": event_type,
        "version": "2.0",
        "retry": 0,
        "event_id": "ev-1",
        "domain": "huntflow.example",
        "webhook_action": action
    })
}

/// Envelope metadata for the 1.0 generation: author required, no domain
pub fn meta_v1(action: &str) -> Value {
    json!({
        "account": account(),
        "author": author(),
        "event_type": "APPLICANT",
        "version": "1.0",
        "retry": 0,
        "event_id": "ev-legacy",
        "webhook_action": action
    })
}

pub fn envelope(meta: Value, event: Value) -> Value {
    json!({"changes": null, "meta": meta, "event": event})
}

pub fn applicant() -> Value {
    json!({
        "id": 42,
        "first_name": "Ivan",
        "last_name": "Petrov",
        "email": "ivan@example.com",
        "birthday": "1990-05-17",
        "social": [
            {"id": 1, "social_type": "TELEGRAM", "value": "@ivan", "verified": true},
            {"id": 2, "social_type": "SKYPE", "value": "ivan.p", "verified": false, "verification_date": null}
        ],
        "pd_agreement": {"state": "sent", "decision_date": null}
    })
}

/// 2.0 applicant log: `source` is required but nullable
pub fn applicant_log_v2() -> Value {
    json!({
        "id": 100,
        "type": "STATUS",
        "status": {"id": 3, "name": "Interview"},
        "created": "2024-03-01T10:00:00+03:00",
        "source": null,
        "files": [{"id": 5, "content_type": "application/pdf", "name": "cv.pdf", "url": "https://files.example/cv.pdf"}]
    })
}

pub fn applicant_log_v1() -> Value {
    json!({
        "id": 100,
        "type": "STATUS",
        "created": "2024-03-01T10:00:00+03:00",
        "hired_in_fill_quota": {
            "id": 9,
            "vacancy_frame": 11,
            "created": "2024-01-01T00:00:00Z",
            "applicants_to_hire": 2,
            "already_hired": null,
            "account_info": {"id": 1, "name": "Olga"}
        }
    })
}

pub fn applicant_tags() -> Value {
    json!([{"id": 1, "name": "senior", "color": "ff0000"}])
}

pub fn applicant_payload_v2(action: &str) -> Value {
    envelope(
        meta_v2("APPLICANT", action),
        json!({
            "applicant": applicant(),
            "applicant_log": applicant_log_v2(),
            "applicant_tags": applicant_tags()
        }),
    )
}

pub fn applicant_payload_v1(action: &str) -> Value {
    envelope(
        meta_v1(action),
        json!({
            "applicant": applicant(),
            "applicant_log": applicant_log_v1(),
            "applicant_tags": applicant_tags()
        }),
    )
}

/// A vacancy with `depth` ancestors reached through `parent`
pub fn vacancy_chain(depth: usize) -> Value {
    let mut vacancy = vacancy(1_000);
    for level in 1..=depth {
        let mut child = self::vacancy(1_000 + level as i64);
        child["parent"] = vacancy;
        vacancy = child;
    }
    vacancy
}

pub fn vacancy(id: i64) -> Value {
    json!({
        "id": id,
        "created": "2024-02-01",
        "hidden": false,
        "multiple": false,
        "position": "Rust developer",
        "priority": 1,
        "state": "OPEN"
    })
}

pub fn vacancy_payload() -> Value {
    envelope(
        meta_v2("VACANCY", "ADD"),
        json!({
            "vacancy": vacancy_chain(2),
            "vacancy_log": {"id": 1, "state": "OPEN", "created": "2024-02-01T09:00:00Z"}
        }),
    )
}

pub fn vacancy_request_payload() -> Value {
    envelope(
        meta_v2("VACANCY-REQUEST", "ADD"),
        json!({
            "vacancy_request": {
                "id": 3,
                "account_vacancy_request": 4,
                "created": "2024-02-01T09:00:00Z",
                "position": "QA",
                "values": {"budget": 100}
            },
            "vacancy_request_log": {"id": 8, "action": "CREATE", "created": "2024-02-01T09:00:00Z"}
        }),
    )
}

pub fn vacancy_external() -> Value {
    json!({
        "id": 12,
        "account_vacancy_external": {
            "id": 2,
            "account_source": {"id": 3, "name": "Job board", "type": "system"},
            "auth_type": "oauth",
            "name": "Board"
        },
        "created": "2024-02-01T09:00:00Z",
        "data": "{}",
        "foreign": "ext-12",
        "vacancy": vacancy(77)
    })
}

pub fn response_payload() -> Value {
    envelope(
        meta_v2("RESPONSE", "ADD"),
        json!({
            "applicant_external_response": {
                "id": 1,
                "created": "2024-02-01T09:00:00Z",
                "data": {"cover": "hello"},
                "foreign": "resp-1",
                "updated": "2024-02-02T09:00:00Z"
            },
            "vacancy_external": vacancy_external()
        }),
    )
}

pub fn offer_payload() -> Value {
    envelope(
        meta_v2("OFFER", "ADD"),
        json!({
            "vacancy": vacancy(5),
            "applicant": applicant(),
            "applicant_offer": {
                "id": 1,
                "account_applicant_offer_log": {"id": 2, "type": "ADD"},
                "applicant_offer_id": 3,
                "created": "2024-02-01T09:00:00Z",
                "values": {"salary": 1000}
            }
        }),
    )
}

pub fn recruitment_evaluation_payload() -> Value {
    let respondent = json!({"id": 4, "name": "Olga", "email": "olga@example.com"});
    envelope(
        meta_v2("RECRUITMENT-EVALUATION", "ADD"),
        json!({
            "recruitment_evaluation": {
                "id": 1,
                "account_survey": {
                    "id": 2,
                    "name": "Scorecard",
                    "schema": {
                        "type": "object",
                        "required": ["comment"],
                        "properties": {"comment": {"type": "string"}},
                        "additionalProperties": false
                    }
                },
                "survey_answer_requests": [
                    {"id": 3, "respondent": respondent, "created": "2024-02-01T09:00:00Z", "state": "SENT"}
                ],
                "survey_answer": {
                    "id": 5,
                    "respondent": respondent,
                    "created": "2024-02-01T09:00:00Z",
                    "updated": "2024-02-01T10:00:00Z",
                    "data": {"comment": "strong"}
                },
                "stars": 4,
                "applicant": applicant(),
                "vacancy": vacancy(5)
            }
        }),
    )
}

pub fn survey_questionary_payload() -> Value {
    envelope(
        meta_v2("SURVEY-QUESTIONARY", "ADD"),
        json!({
            "applicant": applicant(),
            "vacancy": vacancy_external(),
            "applicant_log_id": 100,
            "survey_questionary": {
                "id": 1,
                "survey": {
                    "id": 2,
                    "name": "Onboarding",
                    "created": "2024-02-01T09:00:00Z",
                    "title": "Welcome",
                    "active": true
                },
                "created": "2024-02-01T09:00:00Z",
                "respondent": {"applicant_id": 42, "name": "Ivan"},
                "created_by": {"account_id": 1, "name": "Olga"},
                "answer": {"id": 3, "created": "2024-02-02T09:00:00Z", "data": {"q1": "yes"}},
                "link": "https://survey.example/1"
            }
        }),
    )
}

/// Every valid fixture, one per registered variant
pub fn all_payloads() -> Vec<Value> {
    vec![
        applicant_payload_v1("ADD"),
        applicant_payload_v2("ADD"),
        vacancy_payload(),
        vacancy_request_payload(),
        response_payload(),
        offer_payload(),
        recruitment_evaluation_payload(),
        survey_questionary_payload(),
    ]
}
