use crate::config::{PenaltyWeights, SolverConfig};
use crate::data::{AssignmentInput, AssignmentResult};
use crate::progress::LogProgress;
use crate::solver;
use axum::{Json, Router, routing::post};
use serde::Deserialize;

/// One solve request: the roster and rooms plus optional overrides for the
/// search tunables and penalty weights.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    #[serde(flatten)]
    pub input: AssignmentInput,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub weights: PenaltyWeights,
}

async fn solve_handler(
    Json(request): Json<SolveRequest>,
) -> Result<Json<AssignmentResult>, (axum::http::StatusCode, String)> {
    let mut progress = LogProgress;
    match solver::solve(
        &request.input,
        &request.weights,
        &request.solver,
        &mut progress,
    ) {
        Ok(result) => Ok(Json(result)),
        Err(e) => Err((axum::http::StatusCode::BAD_REQUEST, e)),
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/rooms/solve", post(solve_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Gender, Role};

    #[test]
    fn request_accepts_flat_input_with_overrides() {
        let request: SolveRequest = serde_json::from_str(
            r#"{
                "people": [
                    {"id":"s1","name":"Ali","gender":"m","role":"student","classId":"7a"},
                    {"id":"t1","name":"Herr Roth","gender":"m","role":"teacher","classId":"7b"}
                ],
                "rooms": [
                    {"id":"r101","name":"Sternschnuppe","capacity":4,"corridor":"A"}
                ],
                "forbiddenPairs": [{"a":"s1","b":"t1"}],
                "requiredTeachers": {"A": ["t1"]},
                "solver": {"timeLimitSeconds": 5},
                "weights": {"teacherWrongCorridor": 7}
            }"#,
        )
        .unwrap();
        assert_eq!(request.input.people.len(), 2);
        assert_eq!(request.input.people[1].role, Role::Teacher);
        assert_eq!(request.input.people[1].gender, Gender::M);
        assert_eq!(request.input.forbidden_pairs.len(), 1);
        assert_eq!(request.input.required_teachers["A"], vec!["t1".to_string()]);
        assert_eq!(request.solver.time_limit_seconds, 5.0);
        assert_eq!(request.solver.worker_count, 8);
        assert_eq!(request.weights.teacher_wrong_corridor, 7.0);
        assert_eq!(request.weights.class_mix_per_extra_class, 3.0);
    }

    #[test]
    fn request_defaults_apply_without_overrides() {
        let request: SolveRequest = serde_json::from_str(
            r#"{"people": [], "rooms": []}"#,
        )
        .unwrap();
        assert_eq!(request.solver.time_limit_seconds, 60.0);
        assert_eq!(request.weights.cross_gender_room, 1000.0);
    }
}
