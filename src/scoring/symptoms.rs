/// 参与计分的症状标签，精确匹配，区分大小写
pub const SYMPTOM_VOCABULARY: [&str; 6] = [
    "fever",
    "cough",
    "shortness of breath",
    "fatigue",
    "loss of taste or smell",
    "cold",
];

/// 每个标签各出现一次时的症状得分上限
pub const MAX_SYMPTOM_SCORE: f64 = 20.0;

/// 按 [`SYMPTOM_VOCABULARY`] 计算症状得分
///
/// 不在词表中的标签忽略。不去重，同一标签出现 `k` 次就计 `k` 次
pub fn symptom_score<S: AsRef<str>>(reported: &[S]) -> f64 {
    let matched = reported
        .iter()
        .filter(|label| SYMPTOM_VOCABULARY.contains(&label.as_ref()))
        .count();
    matched as f64 / SYMPTOM_VOCABULARY.len() as f64 * MAX_SYMPTOM_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_report_scores_zero() {
        let none: [&str; 0] = [];
        assert_eq!(symptom_score(&none), 0.0);
    }

    #[test]
    fn two_matches_out_of_six() {
        assert!(approx(symptom_score(&["fever", "cold"]), 20.0 * 2.0 / 6.0));
    }

    #[test]
    fn full_vocabulary_scores_max() {
        assert!(approx(symptom_score(&SYMPTOM_VOCABULARY), MAX_SYMPTOM_SCORE));
    }

    #[test]
    fn unknown_and_differently_cased_labels_are_ignored() {
        assert_eq!(symptom_score(&["Fever", "headache", "COUGH", ""]), 0.0);
    }

    #[test]
    fn repeated_labels_are_counted_each_time() {
        let reported = vec!["fever".to_string(); 9];
        assert!(approx(symptom_score(&reported), 30.0));
    }
}
