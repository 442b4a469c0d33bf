use super::AppState;
use crate::questions::{CorrectAnswer, Question};
use indexmap::IndexMap;

/// Evaluate a submitted answer against a question's correct-answer
/// specification. Selection: the submitted index must be a member of the
/// correct-index set. Estimation: the submitted number must fall inside the
/// tolerance band, both ends inclusive. Non-numeric input is incorrect, not
/// an error.
pub fn evaluate(question: &Question, answer: &serde_json::Value) -> bool {
    match &question.correct_answer {
        CorrectAnswer::Target(target) => {
            let tolerance = question.tolerance.unwrap_or(0.0);
            answer
                .as_f64()
                .is_some_and(|a| a >= target - tolerance && a <= target + tolerance)
        }
        CorrectAnswer::Indices(indices) => {
            answer.as_i64().is_some_and(|a| indices.contains(&a))
        }
    }
}

/// Time-decayed award: a correct answer is worth
/// `floor(min(1200 - 100 * (elapsed_ms / 1000), 1000))` points, so the full
/// 1000 up to two seconds, then 100 fewer per second. There is no lower
/// bound; a slow enough correct answer costs points.
pub fn award(correct: bool, elapsed_ms: u64) -> i64 {
    if !correct {
        return 0;
    }
    (1200.0 - 100.0 * (elapsed_ms as f64 / 1000.0))
        .min(1000.0)
        .floor() as i64
}

/// Rank of `score` within a descending score list: 1-based position of the
/// first entry carrying the same score, so tied participants share the
/// earliest rank. Unknown scores yield rank 0.
pub fn rank_for(ranked: &IndexMap<String, i64>, score: i64) -> usize {
    ranked
        .values()
        .position(|&s| s == score)
        .map_or(0, |p| p + 1)
}

impl AppState {
    pub async fn add_points(&self, name: &str, points: i64) {
        let mut scores = self.scores.write().await;
        *scores.entry(name.to_string()).or_insert(0) += points;
    }

    pub async fn scores_snapshot(&self) -> IndexMap<String, i64> {
        self.scores.read().await.clone()
    }

    /// Ledger sorted by descending score. The sort is stable, so tied
    /// participants keep their insertion order.
    pub async fn ranked_scores(&self) -> IndexMap<String, i64> {
        let mut entries: Vec<(String, i64)> = self
            .scores
            .read()
            .await
            .iter()
            .map(|(name, score)| (name.clone(), *score))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuizConfig;
    use serde_json::json;

    fn estimation(target: f64, tolerance: f64) -> Question {
        Question {
            question: "How many?".to_string(),
            category: Some("guess".to_string()),
            answers: None,
            correct_answer: CorrectAnswer::Target(target),
            tolerance: Some(tolerance),
        }
    }

    fn selection(indices: Vec<i64>) -> Question {
        Question {
            question: "Which option?".to_string(),
            category: None,
            answers: Some(vec!["a".into(), "b".into(), "c".into()]),
            correct_answer: CorrectAnswer::Indices(indices),
            tolerance: None,
        }
    }

    #[test]
    fn test_estimation_band_is_inclusive() {
        let q = estimation(50.0, 5.0);

        assert!(evaluate(&q, &json!(45)));
        assert!(evaluate(&q, &json!(55)));
        assert!(evaluate(&q, &json!(50)));
        assert!(evaluate(&q, &json!(52.5)));

        assert!(!evaluate(&q, &json!(44)));
        assert!(!evaluate(&q, &json!(56)));
    }

    #[test]
    fn test_estimation_non_numeric_is_incorrect() {
        let q = estimation(50.0, 5.0);
        assert!(!evaluate(&q, &json!("fifty")));
        assert!(!evaluate(&q, &json!(null)));
        assert!(!evaluate(&q, &json!([50])));
    }

    #[test]
    fn test_estimation_without_tolerance_requires_exact_match() {
        let mut q = estimation(50.0, 0.0);
        q.tolerance = None;
        assert!(evaluate(&q, &json!(50)));
        assert!(!evaluate(&q, &json!(51)));
    }

    #[test]
    fn test_selection_membership() {
        let empty = selection(vec![]);
        assert!(!evaluate(&empty, &json!(0)));

        let single = selection(vec![1]);
        assert!(evaluate(&single, &json!(1)));
        assert!(!evaluate(&single, &json!(0)));

        let multiple = selection(vec![0, 2]);
        assert!(evaluate(&multiple, &json!(0)));
        assert!(evaluate(&multiple, &json!(2)));
        assert!(!evaluate(&multiple, &json!(1)));
        assert!(!evaluate(&multiple, &json!("0")));
    }

    #[test]
    fn test_award_values() {
        assert_eq!(award(true, 0), 1000);
        assert_eq!(award(true, 2000), 1000);
        assert_eq!(award(true, 5000), 700);
        assert_eq!(award(false, 0), 0);
    }

    #[test]
    fn test_award_is_monotonically_non_increasing() {
        let mut previous = award(true, 0);
        for elapsed in (0..20_000).step_by(500) {
            let points = award(true, elapsed);
            assert!(points <= previous, "award increased at {elapsed}ms");
            previous = points;
        }
    }

    #[test]
    fn test_award_has_no_lower_clamp() {
        // 15 seconds: 1200 - 1500 = -300. Reproduced deliberately.
        assert_eq!(award(true, 15_000), -300);
    }

    #[test]
    fn test_rank_shares_position_for_ties() {
        let ranked: IndexMap<String, i64> = [
            ("ben".to_string(), 900),
            ("carl".to_string(), 900),
            ("anna".to_string(), 500),
        ]
        .into_iter()
        .collect();

        assert_eq!(rank_for(&ranked, 900), 1);
        assert_eq!(rank_for(&ranked, 500), 3);
        assert_eq!(rank_for(&ranked, 123), 0);
    }

    #[tokio::test]
    async fn test_ranked_scores_sort_descending() {
        let state = AppState::new(vec![selection(vec![1])], QuizConfig::default());
        state.add_points("anna", 500).await;
        state.add_points("ben", 900).await;
        state.add_points("carl", 900).await;

        let ranked = state.ranked_scores().await;
        let names: Vec<&str> = ranked.keys().map(String::as_str).collect();

        // Ben and Carl (tied) rank ahead of Anna; the stable sort keeps
        // Ben before Carl.
        assert_eq!(names, vec!["ben", "carl", "anna"]);
        assert_eq!(rank_for(&ranked, 900), 1);
        assert_eq!(rank_for(&ranked, 500), 3);
    }

    #[tokio::test]
    async fn test_add_points_accumulates() {
        let state = AppState::new(vec![selection(vec![1])], QuizConfig::default());
        state.add_points("anna", 1000).await;
        state.add_points("anna", -300).await;
        assert_eq!(state.scores_snapshot().await.get("anna"), Some(&700));
    }
}
